#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sensor_pipe::{
    analytics::{AnalyticsClient, Consumer},
    common::events::EventRecord,
    web::{router::build_router, state::AppState},
};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::util::ServiceExt;

/// 记录所有投递的 Consumer，可配置为固定失败
#[derive(Clone, Default)]
pub struct RecordingConsumer {
    records: Arc<Mutex<Vec<EventRecord>>>,
    flushes: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_with: Option<String>,
}

impl RecordingConsumer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().expect("records lock").clone()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Consumer for RecordingConsumer {
    async fn send(&self, record: EventRecord) -> anyhow::Result<()> {
        if let Some(msg) = &self.fail_with {
            anyhow::bail!("{}", msg);
        }
        self.records.lock().expect("records lock").push(record);
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn make_state(consumer: RecordingConsumer) -> Arc<AppState> {
    Arc::new(AppState::new(AnalyticsClient::new(
        consumer,
        Some("default".into()),
    )))
}

pub fn make_app(consumer: RecordingConsumer) -> Router {
    build_router(make_state(consumer), false)
}

pub async fn post(app: Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", content_type)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("response");

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, body.to_vec())
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, body) = post(app, uri, "application/json", body).await;
    let value: Value = serde_json::from_slice(&body).expect("json");
    (status, value)
}
