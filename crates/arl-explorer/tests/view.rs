//! Resource view loading end to end over a scripted backend

use arl_explorer::prelude::*;
use arl_explorer::{Cell, Filters};
use arl_test_utils::{mixed_result_items, task_record, Method, RecordingNotifier, ScriptedTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    transport: Arc<ScriptedTransport>,
    notifier: Arc<RecordingNotifier>,
    view: ResourceView,
}

fn fixture() -> Fixture {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .with_task_records(vec![task_record("t1", "Recon A", "example.com")])
        .on_get("domain/", json!({"items": mixed_result_items(), "total": 3}))
        .on_get("ip/", json!({"data": [{"ip": "10.0.0.1", "task_id": "t1"}]}));

    let notifier = RecordingNotifier::new();
    let ctx = ApiContext::with_notifier(ApiConfig::default(), notifier.clone());
    let resolver = TaskMetaResolver::new(transport.clone());
    let view = ResourceView::new(ctx, transport.clone(), resolver);
    Fixture {
        transport,
        notifier,
        view,
    }
}

#[tokio::test]
async fn grouped_results_resolve_parent_tasks_once() {
    let Fixture {
        transport, view, ..
    } = fixture();

    let outcome = view.load(LoadRequest::new("domain")).await.unwrap();
    let page = outcome.fresh().unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.mode, DisplayMode::Grouped);

    let ViewBody::Grouped(panels) = &page.body else {
        panic!("expected grouped body");
    };
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[0].title, "Recon A");
    assert_eq!(panels[0].subtitle, "Target: example.com · ID: t1");
    assert_eq!(panels[0].table.len(), 2);
    assert_eq!(panels[1].title, "Unknown task");
    assert_eq!(panels[1].subtitle, "No task ID found");
    assert_eq!(panels[1].count, 1);

    assert_eq!(transport.lookups("task/", "_id", "t1"), 1);
    assert_eq!(transport.call_count(Method::Get, "task/"), 1);
}

#[tokio::test]
async fn query_merges_filters_with_pagination_winning() {
    let Fixture {
        transport, view, ..
    } = fixture();

    let filters = Filters::from([
        ("domain".to_string(), "example.com".to_string()),
        ("page".to_string(), "7".to_string()),
    ]);
    let request = LoadRequest::new("domain")
        .with_filters(filters)
        .with_pagination(Pagination::new("2", "20", "-_id"))
        .with_mode(DisplayMode::Flat);
    view.load(request).await.unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.path, "domain/");
    assert_eq!(call.param("page"), Some(&json!("2")));
    assert_eq!(call.param("size"), Some(&json!("20")));
    assert_eq!(call.param("domain"), Some(&json!("example.com")));
}

#[tokio::test]
async fn superseded_load_is_discarded() {
    let Fixture {
        transport, view, ..
    } = fixture();
    transport.delay_path("domain/", Duration::from_millis(100));

    let (slow, fast) = tokio::join!(
        view.load(LoadRequest::new("domain")),
        view.load(LoadRequest::new("ip")),
    );

    assert!(slow.unwrap().is_stale());
    assert!(!fast.unwrap().is_stale());
    let current = view.current().unwrap();
    assert_eq!(current.resource, "ip");
    assert_eq!(current.generation, view.generation());
}

#[tokio::test]
async fn failed_load_keeps_previous_page() {
    let Fixture {
        transport,
        notifier,
        view,
    } = fixture();

    view.load(LoadRequest::new("domain")).await.unwrap();
    let before = view.current().unwrap();

    transport.fail_get("domain/", 500, "database down");
    let err = view.load(LoadRequest::new("domain")).await.unwrap_err();

    assert_eq!(err.operator_message(), "database down");
    assert!(Arc::ptr_eq(&view.current().unwrap(), &before));
    assert_eq!(
        notifier.errors(),
        vec!["Failed to load domain: database down".to_string()]
    );
}

#[tokio::test]
async fn empty_page_has_empty_body() {
    let Fixture {
        transport, view, ..
    } = fixture();
    transport.on_get("vuln/", json!({"code": 200, "items": [], "total": 0}));

    let outcome = view.load(LoadRequest::new("vuln")).await.unwrap();
    let page = outcome.fresh().unwrap();
    assert!(matches!(page.body, ViewBody::Empty));
    assert_eq!(page.total, 0);
    assert_eq!(transport.call_count(Method::Get, "task/"), 0);
}

#[tokio::test]
async fn rerender_switches_mode_without_refetch() {
    let Fixture {
        transport, view, ..
    } = fixture();

    assert!(view.rerender(DisplayMode::Flat).await.is_none());
    view.load(LoadRequest::new("domain")).await.unwrap();

    let outcome = view.rerender(DisplayMode::Flat).await.unwrap();
    let page = outcome.fresh().unwrap();
    let ViewBody::Flat(table) = &page.body else {
        panic!("expected flat body");
    };
    assert_eq!(table.len(), 3);
    assert_eq!(table.headers(), vec!["task_id", "v"]);
    assert_eq!(table.rows()[2].cells, vec![Cell::Placeholder, Cell::Text("3".into())]);
    assert_eq!(transport.call_count(Method::Get, "domain/"), 1);
}

#[tokio::test]
async fn task_rows_carry_catalog_actions() {
    let Fixture {
        transport, view, ..
    } = fixture();
    transport
        .on_get("task/", json!({"items": [task_record("t1", "Recon A", "example.com")], "total": 1}))
        .on_get("task/stop/t1", json!({"code": 200, "message": "success"}))
        .on_post("task/delete/", json!({"code": 200, "message": "success"}));

    let outcome = view.load(LoadRequest::new("task")).await.unwrap();
    let page = outcome.fresh().unwrap();
    let ViewBody::Flat(table) = &page.body else {
        panic!("expected flat body");
    };
    assert_eq!(
        table.headers(),
        vec!["Name", "Target", "Status", "Tag", "Type", "Started", "Ended", "ID", "Actions"]
    );

    for label in ["Stop", "Delete"] {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let action = table.find_action(label).unwrap();
        table
            .invoke(0, action, move |outcome| {
                let _ = tx.send(outcome);
            })
            .unwrap();
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.row_id.as_deref(), Some("t1"));
        assert_eq!(outcome.result.unwrap()["message"], json!("success"));
    }

    let delete = transport
        .calls()
        .into_iter()
        .find(|call| call.path == "task/delete/")
        .unwrap();
    assert_eq!(
        delete.payload,
        Some(json!({"task_id": ["t1"], "del_task_data": true}))
    );
}
