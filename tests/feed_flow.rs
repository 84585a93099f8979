use crux_core::testing::AppTester;

use dispatch_core::capabilities::http::{HttpOperation, HttpResponse, HttpResult};
use dispatch_core::capabilities::timer::TimerOperation;
use dispatch_core::model::ListKind;
use dispatch_core::pagination::{FilterKey, LoadPhase};
use dispatch_core::{App, Effect, Event, Model};

fn tester() -> (AppTester<App, Effect>, Model) {
    (AppTester::default(), Model::default())
}

fn http_urls(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(request) => {
                let HttpOperation::Execute(r) = &request.operation;
                Some(r.url().as_str().to_string())
            }
            _ => None,
        })
        .collect()
}

fn timer_tokens(effects: &[Effect]) -> Vec<u64> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Timer(request) => {
                let TimerOperation::Start { token, .. } = request.operation;
                Some(token)
            }
            _ => None,
        })
        .collect()
}

fn ok_response(body: &str) -> Box<HttpResult> {
    Box::new(Ok(HttpResponse::ok(body.as_bytes().to_vec())))
}

fn order_json(id: &str, reference: &str) -> String {
    format!(
        r#"{{"id": "{id}", "reference": "{reference}", "customer_name": "Acme Gravel", "status": "PENDING"}}"#
    )
}

fn page_body(orders: &[(&str, &str)], next: Option<&str>, count: Option<u64>) -> String {
    let results: Vec<String> = orders.iter().map(|(id, r)| order_json(id, r)).collect();
    let mut body = format!(r#"{{"results": [{}]"#, results.join(","));
    if let Some(next) = next {
        body.push_str(&format!(r#", "next": "{next}""#));
    }
    if let Some(count) = count {
        body.push_str(&format!(r#", "count": {count}"#));
    }
    body.push('}');
    body
}

#[test]
fn opening_the_orders_feed_fetches_page_one() {
    let (app, mut model) = tester();

    let update = app.update(Event::FeedOpened(ListKind::Orders), &mut model);

    let urls = http_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("/api/v1/orders"), "got {}", urls[0]);
    assert!(urls[0].contains("page_size=25"));
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    assert_eq!(model.orders.phase(), LoadPhase::LoadingFirstPage);

    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(
                &[("o1", "ORD-001"), ("o2", "ORD-002")],
                Some("c2"),
                Some(5),
            )),
        },
        &mut model,
    );

    let view = app.view(&model);
    assert_eq!(view.orders.items.len(), 2);
    assert_eq!(view.orders.items[0].reference, "ORD-001");
    assert!(view.orders.has_more);
    assert_eq!(view.orders.total_count, Some(5));
    assert_eq!(view.orders.phase, LoadPhase::Idle);
}

#[test]
fn load_more_appends_until_the_cursor_is_exhausted() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o1", "ORD-001")], Some("c2"), None)),
        },
        &mut model,
    );

    let update = app.update(Event::LoadMoreRequested(ListKind::Orders), &mut model);
    let urls = http_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("cursor=c2"));

    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o2", "ORD-002")], None, None)),
        },
        &mut model,
    );
    assert_eq!(model.orders.items().len(), 2);
    assert!(!model.orders.has_more());

    // Terminal cursor: further load-more requests go nowhere.
    let update = app.update(Event::LoadMoreRequested(ListKind::Orders), &mut model);
    assert!(http_urls(&update.effects).is_empty());
    assert_eq!(model.orders.items().len(), 2);
}

#[test]
fn superseded_load_more_response_is_dropped() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let first_generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation: first_generation,
            result: ok_response(&page_body(&[("o1", "ORD-001")], Some("c2"), None)),
        },
        &mut model,
    );
    app.update(Event::LoadMoreRequested(ListKind::Orders), &mut model);

    // The user filters while page two is in flight.
    let update = app.update(
        Event::FilterChanged {
            list: ListKind::Orders,
            key: FilterKey::Status,
            value: Some("FINISHED".into()),
        },
        &mut model,
    );
    let urls = http_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("status=FINISHED"));
    let second_generation = model.orders.generation();
    assert_ne!(first_generation, second_generation);

    // Page two of the old result set arrives late.
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation: first_generation,
            result: ok_response(&page_body(&[("o2", "ORD-002")], None, None)),
        },
        &mut model,
    );
    assert!(model.orders.items().is_empty());
    assert_eq!(model.orders.phase(), LoadPhase::LoadingFirstPage);

    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation: second_generation,
            result: ok_response(&page_body(&[("o9", "ORD-009")], None, None)),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.orders.items.len(), 1);
    assert_eq!(view.orders.items[0].reference, "ORD-009");
}

#[test]
fn search_typing_debounces_to_a_single_request() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o1", "ORD-001")], None, None)),
        },
        &mut model,
    );

    // Three keystrokes, three timers, no fetches yet.
    let mut tokens = Vec::new();
    for text in ["g", "gr", "gravel"] {
        let update = app.update(
            Event::FilterChanged {
                list: ListKind::Orders,
                key: FilterKey::Search,
                value: Some(text.into()),
            },
            &mut model,
        );
        assert!(http_urls(&update.effects).is_empty());
        let mut started = timer_tokens(&update.effects);
        assert_eq!(started.len(), 1);
        tokens.append(&mut started);
    }
    assert_eq!(model.orders.items().len(), 1, "typing must not clear items");

    // Superseded timers fire first and are ignored.
    for stale in &tokens[..2] {
        let update = app.update(
            Event::SearchDebounceElapsed {
                list: ListKind::Orders,
                token: *stale,
            },
            &mut model,
        );
        assert!(http_urls(&update.effects).is_empty());
    }

    let update = app.update(
        Event::SearchDebounceElapsed {
            list: ListKind::Orders,
            token: tokens[2],
        },
        &mut model,
    );
    let urls = http_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("search=gravel"));
}

#[test]
fn refresh_replaces_items_with_the_latest_server_state() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o1", "ORD-001")], None, None)),
        },
        &mut model,
    );

    let update = app.update(Event::RefreshRequested(ListKind::Orders), &mut model);
    assert_eq!(http_urls(&update.effects).len(), 1);
    assert_eq!(model.orders.phase(), LoadPhase::Refreshing);

    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o1", "ORD-001"), ("o3", "ORD-003")], None, None)),
        },
        &mut model,
    );
    assert_eq!(model.orders.items().len(), 2);
    assert_eq!(model.orders.phase(), LoadPhase::Idle);
}

#[test]
fn failed_page_load_surfaces_a_toast_and_a_failed_phase() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: Box::new(Ok(HttpResponse::new(500, Vec::new()))),
        },
        &mut model,
    );

    let view = app.view(&model);
    assert_eq!(view.orders.phase, LoadPhase::Failed);
    assert!(view.orders.items.is_empty());
    assert!(view.toast.is_some());
}

#[test]
fn malformed_page_body_is_treated_as_a_failure() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(r#"{"unexpected": true}"#),
        },
        &mut model,
    );

    assert_eq!(model.orders.phase(), LoadPhase::Failed);
    assert!(app.view(&model).toast.is_some());
}

#[test]
fn delete_removes_the_row_immediately_and_issues_the_request() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Orders), &mut model);
    let generation = model.orders.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Orders,
            generation,
            result: ok_response(&page_body(&[("o1", "ORD-001"), ("o2", "ORD-002")], None, None)),
        },
        &mut model,
    );

    let update = app.update(
        Event::DeleteRequested {
            list: ListKind::Orders,
            id: "o1".into(),
        },
        &mut model,
    );

    // Row is gone before the server answers.
    assert_eq!(model.orders.items().len(), 1);
    assert_eq!(model.orders.items()[0].id.as_str(), "o2");
    let urls = http_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].ends_with("/api/v1/orders/o1"));

    // The backend refuses; the row stays gone but the user is told.
    app.update(
        Event::DeleteResponse {
            list: ListKind::Orders,
            id: "o1".into(),
            result: Box::new(Ok(HttpResponse::new(409, Vec::new()))),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.orders.items.len(), 1);
    let toast = view.toast.expect("failure toast");
    assert!(toast.message.contains("refresh"));
}

#[test]
fn closing_a_feed_discards_its_state() {
    let (app, mut model) = tester();

    app.update(Event::FeedOpened(ListKind::Trucks), &mut model);
    let generation = model.trucks.generation();
    app.update(
        Event::PageResponse {
            list: ListKind::Trucks,
            generation,
            result: ok_response(
                r#"{"results": [{"id": "t1", "plate": "KTR-204", "model_name": "Volvo FH", "status": "AVAILABLE"}]}"#,
            ),
        },
        &mut model,
    );
    assert_eq!(model.trucks.items().len(), 1);

    app.update(Event::FeedClosed(ListKind::Trucks), &mut model);
    assert!(model.trucks.items().is_empty());
    assert_eq!(model.trucks.phase(), LoadPhase::Idle);
}
