#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Response,
};
use configuration::{AllowList, Settings};
use database::{ConnectionError, ConnectionManager, Connector};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ALLOWED_ORIGIN: &str = "https://app.test";

/// Stand-in for the database driver. Counts handshakes.
pub struct FakeConnector {
    pub attempts: Arc<AtomicUsize>,
    pub fail: bool,
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = String;

    async fn connect(&self, target: &str) -> Result<String, ConnectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ConnectionError::Handshake {
                target: target.to_string(),
                reason: "connection refused".to_string(),
            })
        } else {
            Ok(format!("session:{target}"))
        }
    }
}

pub fn manager(fail: bool) -> (Arc<ConnectionManager<FakeConnector>>, Arc<AtomicUsize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let connector = FakeConnector {
        attempts: attempts.clone(),
        fail,
    };
    (
        Arc::new(ConnectionManager::new(connector, "mongodb://fake:27017/test")),
        attempts,
    )
}

pub fn settings() -> Settings {
    Settings {
        allowed_origins: AllowList::parse(&format!("{ALLOWED_ORIGIN},http://localhost:5173")),
        ..Settings::default()
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
