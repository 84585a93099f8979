//! The headless app core: a single `update` loop over [`Event`]s that
//! mutates the [`Model`] and asks the shell to do I/O through capabilities.

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{self, LoginResponseBody, PageDto};
use crate::capabilities::{Capabilities, HttpError, HttpResult, KvOutput, KvResult};
use crate::event::Event;
use crate::model::{
    ListKind, Model, OperatorSummary, OrderSummary, RuntimeSecrets, SessionRecord, SessionState,
    SubmitState, ToastKind, TruckSummary, UserId, WorkCostSummary,
};
use crate::pagination::{Applied, FeedCommand, LoadPhase, Page};
use crate::{AppError, ErrorKind, SESSION_STORE_KEY};

/// Runs `body` with the controller that backs `list` bound to `$ctrl`.
/// Controllers are typed per feed, so this stays a macro rather than a
/// function.
macro_rules! for_feed {
    ($model:expr, $list:expr, $ctrl:ident => $body:expr) => {
        match $list {
            ListKind::Orders => {
                let $ctrl = &mut $model.orders;
                $body
            }
            ListKind::Operators => {
                let $ctrl = &mut $model.operators;
                $body
            }
            ListKind::Trucks => {
                let $ctrl = &mut $model.trucks;
                $body
            }
            ListKind::WorkCosts => {
                let $ctrl = &mut $model.work_costs;
                $body
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedView<T> {
    pub items: Vec<T>,
    pub phase: LoadPhase,
    pub has_more: bool,
    pub total_count: Option<u64>,
    /// True once a load finished and found nothing, so the shell can show an
    /// empty state rather than a spinner.
    pub is_empty: bool,
}

impl<T: Clone> FeedView<T> {
    fn from_controller(ctrl: &crate::pagination::ListController<T>) -> Self {
        Self {
            items: ctrl.items().to_vec(),
            phase: ctrl.phase(),
            has_more: ctrl.has_more(),
            total_count: ctrl.total_count(),
            is_empty: ctrl.items().is_empty() && ctrl.phase() == LoadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub session: SessionState,
    pub orders: FeedView<OrderSummary>,
    pub operators: FeedView<OperatorSummary>,
    pub trucks: FeedView<TruckSummary>,
    pub work_costs: FeedView<WorkCostSummary>,
    pub operator_submit: SubmitState,
    pub work_cost_submit: SubmitState,
    pub toast: Option<crate::model::ToastMessage>,
}

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "core event");

        match event {
            Event::AppStarted => {
                caps.kv.get(SESSION_STORE_KEY, |result| {
                    Event::SessionLoaded(Box::new(result))
                });
            }

            Event::Configured(config) => {
                model.config = *config;
            }

            Event::SessionLoaded(result) => {
                model.session = restore_session(&mut model.secrets, *result);
            }

            Event::LoginRequested { email, password } => {
                if matches!(model.session, SessionState::Authenticating) {
                    return;
                }
                model.session = SessionState::Authenticating;
                match api::login_request(&model.config, &email, &password) {
                    Ok(request) => {
                        caps.http.send(request, |result| {
                            Event::LoginResponse(Box::new(result))
                        });
                    }
                    Err(err) => {
                        warn!(error = %err, "login request could not be built");
                        model.session = SessionState::SignedOut;
                        model.show_toast(err.user_facing_message(), ToastKind::Error);
                    }
                }
            }

            Event::LoginResponse(result) => match parse_json::<LoginResponseBody>(&result) {
                Ok(body) => {
                    model.secrets.token = Some(secrecy::SecretString::new(body.token.clone()));
                    let display_name = body
                        .display_name
                        .unwrap_or_else(|| body.user_id.clone());
                    model.session = SessionState::SignedIn {
                        user_id: UserId::new(body.user_id.clone()),
                        display_name: display_name.clone(),
                    };
                    let record = SessionRecord {
                        user_id: UserId::new(body.user_id),
                        display_name,
                        token: body.token,
                    };
                    match serde_json::to_vec(&record) {
                        Ok(bytes) => caps.kv.set(SESSION_STORE_KEY, bytes, |result| {
                            Event::SessionPersisted(Box::new(result))
                        }),
                        Err(err) => warn!(error = %err, "session record not serializable"),
                    }
                }
                Err(err) => {
                    warn!(error = %err, "login failed");
                    model.session = SessionState::SignedOut;
                    model.show_toast(err.user_facing_message(), ToastKind::Error);
                }
            },

            Event::SessionPersisted(result) => {
                if let Err(err) = *result {
                    warn!(error = %err, "session could not be persisted");
                    model.show_toast(
                        "Signed in, but the session could not be saved on this device.",
                        ToastKind::Warning,
                    );
                }
            }

            Event::LogoutRequested => {
                model.secrets = RuntimeSecrets::default();
                model.session = SessionState::SignedOut;
                model.orders.close();
                model.operators.close();
                model.trucks.close();
                model.work_costs.close();
                model.active_toast = None;
                caps.kv.delete(SESSION_STORE_KEY, |result| {
                    Event::SessionCleared(Box::new(result))
                });
            }

            Event::SessionCleared(result) => {
                if let Err(err) = *result {
                    warn!(error = %err, "stored session could not be cleared");
                }
            }

            Event::FeedOpened(list) => {
                let cmd = for_feed!(model, list, ctrl => ctrl.open());
                self.run_feed_command(model, list, cmd, caps);
            }

            Event::FeedClosed(list) => {
                for_feed!(model, list, ctrl => ctrl.close());
            }

            Event::FilterChanged { list, key, value } => {
                let cmd = for_feed!(model, list, ctrl => ctrl.set_filter(key, value));
                if let Some(cmd) = cmd {
                    self.run_feed_command(model, list, cmd, caps);
                }
            }

            Event::SearchDebounceElapsed { list, token } => {
                let cmd = for_feed!(model, list, ctrl => ctrl.debounce_elapsed(token));
                if let Some(cmd) = cmd {
                    self.run_feed_command(model, list, cmd, caps);
                }
            }

            Event::LoadMoreRequested(list) => {
                let cmd = for_feed!(model, list, ctrl => ctrl.load_more());
                if let Some(cmd) = cmd {
                    self.run_feed_command(model, list, cmd, caps);
                }
            }

            Event::RefreshRequested(list) => {
                let cmd = for_feed!(model, list, ctrl => ctrl.refresh());
                self.run_feed_command(model, list, cmd, caps);
            }

            Event::PageResponse {
                list,
                generation,
                result,
            } => {
                self.apply_page_response(model, list, generation, &result);
            }

            Event::DeleteRequested { list, id } => {
                let removed = remove_by_id(model, list, &id);
                if !removed {
                    debug!(list = list.as_str(), "delete target already gone");
                }
                match api::delete_request(&model.config, list, &id, token(model).as_deref()) {
                    Ok(request) => {
                        caps.http.send(request, move |result| Event::DeleteResponse {
                            list,
                            id,
                            result: Box::new(result),
                        });
                    }
                    Err(err) => {
                        warn!(error = %err, "delete request could not be built");
                        model.show_toast(
                            "Delete failed. Pull to refresh to restore the list.",
                            ToastKind::Error,
                        );
                    }
                }
            }

            Event::DeleteResponse { list, id, result } => {
                if let Err(err) = status_of(&result) {
                    warn!(
                        list = list.as_str(),
                        id = id.as_str(),
                        error = %err,
                        "remote delete failed after optimistic removal"
                    );
                    model.show_toast(
                        "Delete failed. Pull to refresh to restore the list.",
                        ToastKind::Error,
                    );
                }
            }

            Event::OperatorDraftSubmitted(draft) => {
                if model.operator_submit.is_submitting() {
                    return;
                }
                match draft.into_payload() {
                    Ok(payload) => {
                        model.operator_submit = SubmitState::Submitting;
                        self.submit_create(model, ListKind::Operators, &payload, caps, |result| {
                            Event::OperatorCreateResponse(Box::new(result))
                        });
                    }
                    Err(err) => {
                        model.operator_submit = SubmitState::Failed {
                            message: err.to_string(),
                        };
                    }
                }
            }

            Event::OperatorCreateResponse(result) => match status_of(&result) {
                Ok(()) => {
                    model.operator_submit = SubmitState::Idle;
                    model.show_toast("Operator created.", ToastKind::Success);
                    let cmd = model.operators.refresh();
                    self.run_feed_command(model, ListKind::Operators, cmd, caps);
                }
                Err(err) => {
                    model.operator_submit = SubmitState::Failed {
                        message: err.user_facing_message(),
                    };
                }
            },

            Event::WorkCostSubmitted(draft) => {
                if model.work_cost_submit.is_submitting() {
                    return;
                }
                match draft.into_payload() {
                    Ok(payload) => {
                        model.work_cost_submit = SubmitState::Submitting;
                        self.submit_create(model, ListKind::WorkCosts, &payload, caps, |result| {
                            Event::WorkCostCreateResponse(Box::new(result))
                        });
                    }
                    Err(err) => {
                        model.work_cost_submit = SubmitState::Failed {
                            message: err.to_string(),
                        };
                    }
                }
            }

            Event::WorkCostCreateResponse(result) => match status_of(&result) {
                Ok(()) => {
                    model.work_cost_submit = SubmitState::Idle;
                    model.show_toast("Work cost recorded.", ToastKind::Success);
                    let cmd = model.work_costs.refresh();
                    self.run_feed_command(model, ListKind::WorkCosts, cmd, caps);
                }
                Err(err) => {
                    model.work_cost_submit = SubmitState::Failed {
                        message: err.user_facing_message(),
                    };
                }
            },

            Event::ToastDismissed => {
                model.active_toast = None;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            session: model.session.clone(),
            orders: FeedView::from_controller(&model.orders),
            operators: FeedView::from_controller(&model.operators),
            trucks: FeedView::from_controller(&model.trucks),
            work_costs: FeedView::from_controller(&model.work_costs),
            operator_submit: model.operator_submit.clone(),
            work_cost_submit: model.work_cost_submit.clone(),
            toast: model.active_toast.clone(),
        }
    }
}

impl App {
    /// Turns a [`FeedCommand`] into the matching capability call.
    fn run_feed_command(
        &self,
        model: &mut Model,
        list: ListKind,
        cmd: FeedCommand,
        caps: &Capabilities,
    ) {
        match cmd {
            FeedCommand::FetchPage {
                generation,
                cursor,
                filters,
            } => {
                let request = api::list_request(
                    &model.config,
                    list,
                    cursor.as_ref(),
                    &filters,
                    token(model).as_deref(),
                );
                match request {
                    Ok(request) => {
                        caps.http.send(request, move |result| Event::PageResponse {
                            list,
                            generation,
                            result: Box::new(result),
                        });
                    }
                    Err(err) => {
                        warn!(list = list.as_str(), error = %err, "page request could not be built");
                        self.fail_feed(model, list, generation, &err);
                    }
                }
            }
            FeedCommand::StartDebounce { token, delay_ms } => {
                caps.timer.start(token, delay_ms, move |token| {
                    Event::SearchDebounceElapsed { list, token }
                });
            }
        }
    }

    fn submit_create<T, F>(
        &self,
        model: &mut Model,
        list: ListKind,
        payload: &T,
        caps: &Capabilities,
        make_event: F,
    ) where
        T: Serialize,
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        match api::create_request(&model.config, list, payload, token(model).as_deref()) {
            Ok(request) => caps.http.send(request, make_event),
            Err(err) => {
                warn!(list = list.as_str(), error = %err, "create request could not be built");
                let failed = SubmitState::Failed {
                    message: err.user_facing_message(),
                };
                match list {
                    ListKind::Operators => model.operator_submit = failed,
                    ListKind::WorkCosts => model.work_cost_submit = failed,
                    ListKind::Orders | ListKind::Trucks => {}
                }
            }
        }
    }

    fn apply_page_response(
        &self,
        model: &mut Model,
        list: ListKind,
        generation: u64,
        result: &HttpResult,
    ) {
        let applied = match list {
            ListKind::Orders => parse_page::<OrderSummary>(result)
                .map(|page| model.orders.apply_page(generation, page)),
            ListKind::Operators => parse_page::<OperatorSummary>(result)
                .map(|page| model.operators.apply_page(generation, page)),
            ListKind::Trucks => parse_page::<TruckSummary>(result)
                .map(|page| model.trucks.apply_page(generation, page)),
            ListKind::WorkCosts => parse_page::<WorkCostSummary>(result)
                .map(|page| model.work_costs.apply_page(generation, page)),
        };

        match applied {
            Ok(Applied::Stale) => {
                debug!(list = list.as_str(), generation, "stale page dropped");
            }
            Ok(applied) => {
                debug!(list = list.as_str(), generation, ?applied, "page applied");
            }
            Err(err) => {
                warn!(list = list.as_str(), generation, error = %err, "page load failed");
                self.fail_feed(model, list, generation, &err);
            }
        }
    }

    fn fail_feed(&self, model: &mut Model, list: ListKind, generation: u64, err: &AppError) {
        let applied = for_feed!(model, list, ctrl => ctrl.apply_failure(generation));
        // A stale failure must not surface UI for a feed that moved on.
        if applied == Applied::Failed {
            model.show_toast(err.user_facing_message(), ToastKind::Error);
        }
    }
}

fn token(model: &Model) -> Option<String> {
    model
        .secrets
        .token
        .as_ref()
        .map(|t| t.expose_secret().clone())
}

fn restore_session(secrets: &mut RuntimeSecrets, result: KvResult) -> SessionState {
    match result {
        Ok(KvOutput::Value(Some(bytes))) => {
            match serde_json::from_slice::<SessionRecord>(&bytes) {
                Ok(record) => {
                    secrets.token = Some(secrecy::SecretString::new(record.token));
                    SessionState::SignedIn {
                        user_id: record.user_id,
                        display_name: record.display_name,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stored session is unreadable, signing out");
                    SessionState::SignedOut
                }
            }
        }
        Ok(KvOutput::Value(None) | KvOutput::Done) => SessionState::SignedOut,
        Err(err) => {
            warn!(error = %err, "session store unavailable, signing out");
            SessionState::SignedOut
        }
    }
}

/// Classifies a transport result and, on success, decodes the JSON body.
fn parse_json<T: DeserializeOwned>(result: &HttpResult) -> Result<T, AppError> {
    let response = success_response(result)?;
    response.json::<T>().map_err(|err| {
        AppError::new(
            ErrorKind::Deserialization,
            format!("response body did not match the expected shape: {err}"),
        )
    })
}

fn parse_page<T: DeserializeOwned>(result: &HttpResult) -> Result<Page<T>, AppError> {
    parse_json::<PageDto<T>>(result).map(Into::into)
}

/// The 2xx response, or everything else mapped to a typed [`AppError`].
fn success_response(result: &HttpResult) -> Result<&crate::capabilities::HttpResponse, AppError> {
    match result {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => Err(AppError::from_http_status(
            response.status,
            Some(&response.body),
        )),
        Err(HttpError::Timeout { timeout_ms }) => Err(AppError::new(
            ErrorKind::Timeout,
            format!("request timed out after {timeout_ms}ms"),
        )),
        Err(err) => Err(AppError::new(ErrorKind::Network, err.to_string())),
    }
}

fn status_of(result: &HttpResult) -> Result<(), AppError> {
    success_response(result).map(|_| ())
}

fn remove_by_id(model: &mut Model, list: ListKind, id: &str) -> bool {
    match list {
        ListKind::Orders => model.orders.remove_item(|item| item.id.as_str() == id),
        ListKind::Operators => model.operators.remove_item(|item| item.id.as_str() == id),
        ListKind::Trucks => model.trucks.remove_item(|item| item.id.as_str() == id),
        ListKind::WorkCosts => model.work_costs.remove_item(|item| item.id.as_str() == id),
    }
}
