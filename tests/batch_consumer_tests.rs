use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sensor_pipe::{
    analytics::{BatchConsumer, BatchConsumerConfig, Consumer},
    common::events::{EventRecord, RecordType},
    common::properties::Properties,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Deserialize)]
struct Upload {
    data_list: String,
    gzip: String,
}

#[derive(Clone)]
struct Collector {
    batches: Arc<Mutex<Vec<Vec<Value>>>>,
    status: StatusCode,
}

async fn collect(State(collector): State<Collector>, Form(upload): Form<Upload>) -> StatusCode {
    assert_eq!(upload.gzip, "0");
    let raw = STANDARD.decode(upload.data_list).expect("base64");
    let batch: Vec<Value> = serde_json::from_slice(&raw).expect("json array");
    collector.batches.lock().expect("lock").push(batch);
    collector.status
}

async fn start_collector(status: StatusCode) -> (String, Arc<Mutex<Vec<Vec<Value>>>>) {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/sa", post(collect))
        .with_state(Collector {
            batches: batches.clone(),
            status,
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("collector");
    });

    (format!("http://{}/sa", addr), batches)
}

fn consumer_config(
    server_url: String,
    batch_size: usize,
    flush_interval: Duration,
) -> BatchConsumerConfig {
    BatchConsumerConfig {
        server_url,
        batch_size,
        flush_interval,
        request_timeout: Duration::from_secs(5),
    }
}

fn record(distinct_id: &str) -> EventRecord {
    EventRecord::new(
        RecordType::Track,
        distinct_id,
        Some("view"),
        Properties::new(),
        false,
    )
}

#[tokio::test]
async fn full_buffer_is_sent_inline() {
    let (url, batches) = start_collector(StatusCode::OK).await;
    let consumer =
        BatchConsumer::new(consumer_config(url, 2, Duration::from_secs(3600))).expect("consumer");

    consumer.send(record("u1")).await.expect("send");
    assert!(batches.lock().unwrap().is_empty());
    assert_eq!(consumer.buffered().await, 1);

    consumer.send(record("u2")).await.expect("send");
    let sent = batches.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 2);
    assert_eq!(sent[0][0]["distinct_id"], "u1");
    assert_eq!(sent[0][1]["distinct_id"], "u2");
    assert_eq!(sent[0][0]["type"], "track");
    assert_eq!(consumer.buffered().await, 0);
}

#[tokio::test]
async fn close_flushes_remaining_records() {
    let (url, batches) = start_collector(StatusCode::OK).await;
    let consumer =
        BatchConsumer::new(consumer_config(url, 10, Duration::from_secs(3600))).expect("consumer");

    consumer.send(record("u1")).await.expect("send");
    consumer.close().await.expect("close");

    let sent = batches.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 1);
}

#[tokio::test]
async fn timer_flushes_partial_batch() {
    let (url, batches) = start_collector(StatusCode::OK).await;
    let consumer =
        BatchConsumer::new(consumer_config(url, 10, Duration::from_millis(50))).expect("consumer");

    consumer.send(record("u1")).await.expect("send");

    let mut delivered = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(25)).await;
        if !batches.lock().unwrap().is_empty() {
            delivered = true;
            break;
        }
    }
    assert!(delivered);
    consumer.close().await.expect("close");
}

#[tokio::test]
async fn collector_error_is_returned() {
    let (url, _batches) = start_collector(StatusCode::INTERNAL_SERVER_ERROR).await;
    let consumer =
        BatchConsumer::new(consumer_config(url, 1, Duration::from_secs(3600))).expect("consumer");

    let err = consumer
        .send(record("u1"))
        .await
        .expect_err("collector error");
    assert_eq!(err.to_string(), "collector responded with status 500");
    assert_eq!(consumer.buffered().await, 0);
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let result = BatchConsumer::new(consumer_config(
        "not a url".into(),
        10,
        Duration::from_secs(1),
    ));
    assert!(result.is_err());
}
