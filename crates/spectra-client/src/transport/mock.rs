//! Scripted in-memory transport for development and testing.
//!
//! Replies are queued per `(method, path)` and consumed in order; every
//! request is recorded so tests can assert on exactly what went over the
//! wire. Unscripted routes answer `404 {"success":false}`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use spectra_core::error::AppError;
use spectra_core::result::AppResult;

use super::{ApiRequest, ApiTransport, Method, ProgressSender, RawResponse, UploadPayload};

/// One scripted reply to a plain request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply with a status and body.
    Respond(RawResponse),
    /// Fail as if no response arrived.
    Fail(AppError),
}

/// One scripted upload behaviour.
#[derive(Debug, Clone)]
pub enum MockUpload {
    /// Report the given byte counters, then reply.
    Complete {
        /// `(sent, total)` pairs reported before replying.
        progress: Vec<(u64, u64)>,
        /// The reply.
        response: RawResponse,
    },
    /// Report the given byte counters, then never finish.
    Stall {
        /// `(sent, total)` pairs reported before stalling.
        progress: Vec<(u64, u64)>,
    },
    /// Report the given byte counters, then fail at the network level.
    Fail {
        /// `(sent, total)` pairs reported before failing.
        progress: Vec<(u64, u64)>,
        /// Failure message.
        message: String,
    },
}

/// Scripted transport that records every exchange.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Queued replies per route.
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    /// Queued upload behaviours.
    uploads: Mutex<VecDeque<MockUpload>>,
    /// Every request received, in order.
    requests: Mutex<Vec<ApiRequest>>,
    /// Short paths of every upload started, in order.
    upload_calls: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply for a route.
    pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(
            method,
            path,
            MockReply::Respond(RawResponse::new(status, body.to_string())),
        )
    }

    /// Queue a raw (possibly non-JSON) reply for a route.
    pub fn reply_raw(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.push(
            method,
            path,
            MockReply::Respond(RawResponse::new(status, body.to_string())),
        )
    }

    /// Queue a `{ success: true, payload }` reply with status 200.
    pub fn ok(&self, method: Method, path: &str, payload: Value) -> &Self {
        self.reply(method, path, 200, json!({ "success": true, "payload": payload }))
    }

    /// Queue a `{ success: false, payload: message }` reply.
    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        self.reply(method, path, status, json!({ "success": false, "payload": message }))
    }

    /// Queue a transport-level failure for a route.
    pub fn unreachable(&self, method: Method, path: &str) -> &Self {
        self.push(
            method,
            path,
            MockReply::Fail(AppError::server_unreachable("connection refused")),
        )
    }

    /// Queue an upload behaviour.
    pub fn upload(&self, behaviour: MockUpload) -> &Self {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(behaviour);
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for a route.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }

    /// Short paths of all uploads started so far.
    pub fn upload_calls(&self) -> Vec<String> {
        self.upload_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, method: Method, path: &str, reply: MockReply) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    fn next_reply(&self, request: &ApiRequest) -> MockReply {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&(request.method, request.path()))
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                MockReply::Respond(RawResponse::new(
                    404,
                    json!({ "success": false, "payload": "Not found" }).to_string(),
                ))
            })
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> AppResult<RawResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        match self.next_reply(request) {
            MockReply::Respond(response) => Ok(response),
            MockReply::Fail(err) => Err(err),
        }
    }

    async fn upload(
        &self,
        short_path: &str,
        _payload: &UploadPayload,
        progress: ProgressSender,
    ) -> AppResult<RawResponse> {
        self.upload_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(short_path.to_string());

        let behaviour = self
            .uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(MockUpload::Complete {
                progress: Vec::new(),
                response: RawResponse::new(
                    200,
                    json!({ "success": true, "payload": { "short_path": short_path } })
                        .to_string(),
                ),
            });

        match behaviour {
            MockUpload::Complete { progress: steps, response } => {
                for (sent, total) in steps {
                    progress.report(sent, total);
                }
                Ok(response)
            }
            MockUpload::Stall { progress: steps } => {
                for (sent, total) in steps {
                    progress.report(sent, total);
                }
                futures::future::pending::<AppResult<RawResponse>>().await
            }
            MockUpload::Fail { progress: steps, message } => {
                for (sent, total) in steps {
                    progress.report(sent, total);
                }
                Err(AppError::upload_transport(message))
            }
        }
    }
}
