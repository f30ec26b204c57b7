//! Test doubles for the transport layer
//!
//! Compiled for unit tests and for integration tests through the
//! `test-support` feature.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::{ClientError, ClientResult};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, RequestBody};

/// One request as seen by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

enum Scripted {
    Response(ApiResponse),
    NetworkError(String),
}

/// Transport that replays queued responses in order and records every call.
///
/// An exhausted queue answers 404 so a missing script line fails loudly.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ApiResponse) {
        self.queue.lock().push_back(Scripted::Response(response));
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(ApiResponse::json(status, &body));
    }

    pub fn push_network_error(&self, message: &str) {
        self.queue
            .lock()
            .push_back(Scripted::NetworkError(message.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// Number of calls made to exactly `path`
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.path == path).count()
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        self.calls.lock().push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer: bearer.map(str::to_string),
        });
        let next = self.queue.lock().pop_front();
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::NetworkError(message)) => Err(ClientError::Network(message)),
            None => Ok(ApiResponse::json(
                404,
                &serde_json::json!({ "message": format!("no scripted response for {}", request.path) }),
            )),
        }
    }
}
