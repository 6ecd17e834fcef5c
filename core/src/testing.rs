//! In-crate transport double for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

enum Reply {
    Response(HttpResponse),
    Failure(String),
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a queue of canned replies and records what was sent.
///
/// Clones share the same queue, so a test can keep one handle while the
/// engine owns another.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, response: HttpResponse) {
        self.lock().replies.push_back(Reply::Response(response));
    }

    pub(crate) fn push_json(&self, body: serde_json::Value) {
        self.push(HttpResponse::new(200, body.to_string()));
    }

    pub(crate) fn fail(&self, message: &str) {
        self.lock().replies.push_back(Reply::Failure(message.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.lock().requests.last().cloned().expect("no request was sent")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.lock();
        script.requests.push(request.clone());
        match script.replies.pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("no scripted reply left")),
        }
    }
}
