use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult};
use crate::forms::{OperatorDraft, WorkCostDraft};
use crate::model::ListKind;
use crate::pagination::FilterKey;
use crate::CoreConfig;

/// Everything that can happen to the core: shell interactions and
/// capability completions. Large payloads are boxed to keep the enum small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // App lifecycle
    AppStarted,
    Configured(Box<CoreConfig>),

    // Session
    SessionLoaded(Box<KvResult>),
    LoginRequested { email: String, password: String },
    LoginResponse(Box<HttpResult>),
    SessionPersisted(Box<KvResult>),
    LogoutRequested,
    SessionCleared(Box<KvResult>),

    // Paginated feeds (orders, operators, trucks, work costs)
    FeedOpened(ListKind),
    FeedClosed(ListKind),
    FilterChanged {
        list: ListKind,
        key: FilterKey,
        value: Option<String>,
    },
    SearchDebounceElapsed {
        list: ListKind,
        token: u64,
    },
    LoadMoreRequested(ListKind),
    RefreshRequested(ListKind),
    PageResponse {
        list: ListKind,
        generation: u64,
        result: Box<HttpResult>,
    },
    DeleteRequested {
        list: ListKind,
        id: String,
    },
    DeleteResponse {
        list: ListKind,
        id: String,
        result: Box<HttpResult>,
    },

    // Mutation forms
    OperatorDraftSubmitted(Box<OperatorDraft>),
    OperatorCreateResponse(Box<HttpResult>),
    WorkCostSubmitted(Box<WorkCostDraft>),
    WorkCostCreateResponse(Box<HttpResult>),

    // Transient UI state
    ToastDismissed,
}

impl Event {
    /// Stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configured(_) => "configured",
            Self::SessionLoaded(_) => "session_loaded",
            Self::LoginRequested { .. } => "login_requested",
            Self::LoginResponse(_) => "login_response",
            Self::SessionPersisted(_) => "session_persisted",
            Self::LogoutRequested => "logout_requested",
            Self::SessionCleared(_) => "session_cleared",
            Self::FeedOpened(_) => "feed_opened",
            Self::FeedClosed(_) => "feed_closed",
            Self::FilterChanged { .. } => "filter_changed",
            Self::SearchDebounceElapsed { .. } => "search_debounce_elapsed",
            Self::LoadMoreRequested(_) => "load_more_requested",
            Self::RefreshRequested(_) => "refresh_requested",
            Self::PageResponse { .. } => "page_response",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::DeleteResponse { .. } => "delete_response",
            Self::OperatorDraftSubmitted(_) => "operator_draft_submitted",
            Self::OperatorCreateResponse(_) => "operator_create_response",
            Self::WorkCostSubmitted(_) => "work_cost_submitted",
            Self::WorkCostCreateResponse(_) => "work_cost_create_response",
            Self::ToastDismissed => "toast_dismissed",
        }
    }
}
