//! Testing utilities for the ARL console workspace
//!
//! Scripted transport, recording notifier and record fixtures.

#![allow(missing_docs)]

use arl_transport::{
    Notice, Notifier, QueryParams, RequestOptions, Transport, TransportError, TransportResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub params: QueryParams,
    pub payload: Option<Value>,
    pub silent: bool,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Body(Value),
    Status(u16, String),
}

type Responder = Arc<dyn Fn(&RecordedCall) -> Reply + Send + Sync>;

/// In-memory transport answering from per-route scripts
///
/// Every call is recorded before the optional delay, so counts reflect
/// issued requests even while they are still in flight. Unscripted routes
/// answer with status 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), Responder>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
    route_delays: Mutex<HashMap<String, Duration>>,
    unreachable: AtomicBool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay every call to one path, on top of the global delay
    pub fn delay_path(&self, path: &str, delay: Duration) -> &Self {
        self.route_delays.lock().insert(path.to_string(), delay);
        self
    }

    pub fn on_get(&self, path: &str, body: Value) -> &Self {
        self.respond(Method::Get, path, move |_| Reply::Body(body.clone()))
    }

    pub fn on_post(&self, path: &str, body: Value) -> &Self {
        self.respond(Method::Post, path, move |_| Reply::Body(body.clone()))
    }

    pub fn fail_get(&self, path: &str, status: u16, message: &str) -> &Self {
        let message = message.to_string();
        self.respond(Method::Get, path, move |_| Reply::Status(status, message.clone()))
    }

    pub fn respond<F>(&self, method: Method, path: &str, responder: F) -> &Self
    where
        F: Fn(&RecordedCall) -> Reply + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .insert((method, path.to_string()), Arc::new(responder));
        self
    }

    /// Answer task lookups (`GET task/?_id=..`) from a fixed table
    pub fn with_task_records(&self, records: Vec<Value>) -> &Self {
        let by_id: HashMap<String, Value> = records
            .into_iter()
            .filter_map(|r| Some((r.get("_id")?.as_str()?.to_string(), r)))
            .collect();
        self.respond(Method::Get, "task/", move |call| {
            let id = call.param("_id").and_then(Value::as_str).unwrap_or_default();
            let items: Vec<Value> = by_id.get(id).cloned().into_iter().collect();
            let total = items.len();
            Reply::Body(json!({"items": items, "total": total}))
        })
    }

    /// Make every subsequent call fail with a network error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// GET calls to `path` whose `key` parameter equals `value`
    pub fn lookups(&self, path: &str, key: &str, value: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| {
                c.method == Method::Get
                    && c.path == path
                    && c.param(key).and_then(Value::as_str) == Some(value)
            })
            .count()
    }

    async fn dispatch(&self, call: RecordedCall) -> TransportResult<Value> {
        self.calls.lock().push(call.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let route_delay = self.route_delays.lock().get(&call.path).copied();
        if let Some(delay) = route_delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".into()));
        }
        let responder = self
            .routes
            .lock()
            .get(&(call.method, call.path.clone()))
            .cloned();
        match responder.map(|r| r(&call)) {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status, message)) => Err(TransportError::status(status, message)),
            None => Err(TransportError::status(404, "not found")),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_with(
        &self,
        path: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        self.dispatch(RecordedCall {
            method: Method::Get,
            path: path.to_string(),
            params: params.clone(),
            payload: None,
            silent: options.silent,
        })
        .await
    }

    async fn post_with(
        &self,
        path: &str,
        payload: &Value,
        options: RequestOptions,
    ) -> TransportResult<Value> {
        self.dispatch(RecordedCall {
            method: Method::Post,
            path: path.to_string(),
            params: QueryParams::new(),
            payload: Some(payload.clone()),
            silent: options.silent,
        })
        .await
    }
}

/// Notifier keeping every notice for later assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.tone == arl_transport::Tone::Error)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

pub fn task_record(id: &str, name: &str, target: &str) -> Value {
    json!({"_id": id, "name": name, "target": target, "status": "done"})
}

/// Two records of task `t1` and one without a parent reference
pub fn mixed_result_items() -> Vec<Value> {
    vec![
        json!({"task_id": "t1", "v": 1}),
        json!({"task_id": "t1", "v": 2}),
        json!({"v": 3}),
    ]
}
