//! Shared helpers: an in-memory [`Transport`] that replays scripted
//! responses and records every request it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use labelbase_client::{Transport, TransportError};
use reqwest::Method;
use serde_json::Value;

/// One request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

type Reply = Result<Option<Value>, TransportError>;

#[derive(Default)]
pub struct FakeTransport {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with a JSON body.
    pub fn reply(&self, body: Value) -> &Self {
        self.replies.borrow_mut().push_back(Ok(Some(body)));
        self
    }

    /// Queue a successful response with an empty body.
    pub fn reply_empty(&self) -> &Self {
        self.replies.borrow_mut().push_back(Ok(None));
        self
    }

    /// Queue a 404.
    pub fn reply_not_found(&self) -> &Self {
        self.replies
            .borrow_mut()
            .push_back(Err(TransportError::NotFound {
                message: "Not found".into(),
            }));
        self
    }

    /// Queue an arbitrary non-2xx status.
    pub fn reply_status(&self, status: u16) -> &Self {
        self.replies.borrow_mut().push_back(Err(TransportError::Api {
            status,
            message: format!("HTTP {status}"),
        }));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// `"METHOD path"` for every call, in order.
    pub fn requests(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.calls.borrow().last().and_then(|c| c.body.clone())
    }
}

impl Transport for FakeTransport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Reply {
        self.calls.borrow_mut().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(TransportError::Api {
                status: 0,
                message: "no scripted response".into(),
            }))
    }
}
