//! In-process `HttpBackend` that records requests and replays canned
//! responses.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::HttpBackend;

type Canned = Result<(u16, String), String>;

#[derive(Clone, Default)]
pub struct RecordingBackend {
    responses: Arc<Mutex<VecDeque<Canned>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response. The last queued response repeats once the queue is
    /// down to it.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.lock().push_back(Ok((status, body.to_string())));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.responses.lock().push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpBackend for RecordingBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().push(request);
        let next = {
            let mut queue = self.responses.lock();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };
        match next {
            Some(Ok((status, body))) => Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body,
            }),
            Some(Err(message)) => Err(ApiError::Transport(message)),
            None => Err(ApiError::Transport("no response queued".to_string())),
        }
    }
}
