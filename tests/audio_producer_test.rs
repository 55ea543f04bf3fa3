//! 直播音频生产者测试

use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use serde_json::json;

use rat_radio::server::audio_producer::AudioProducer;
use rat_radio::server::client_registry::ClientStreamRegistry;
use rat_radio::server::command_handler::{CommandPayload, CommandProcessor, RadioCommandProcessor};

fn fixture_track(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let track = dir.path().join("track.mp3");
    // 内容无所谓，生产者按字节分发
    std::fs::write(&track, vec![0xAAu8; 64 * 1024]).unwrap();
    track
}

fn command(name: &str) -> CommandPayload {
    serde_json::from_value(json!({ "command": name })).unwrap()
}

#[tokio::test]
async fn start_delivers_chunks_to_attached_client() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = AudioProducer::new(Arc::clone(&registry), fixture_track(&dir), 128_000);

    let (_connection, mut body) = registry.attach();

    producer.start_streaming().await.expect("启动直播失败");
    assert!(producer.is_streaming().await);

    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("等待直播数据超时")
        .expect("直播流意外结束")
        .expect("直播流返回错误帧");
    let chunk = frame.into_data().expect("应为数据帧");
    assert!(!chunk.is_empty());

    producer.stop_streaming().await;
    assert!(!producer.is_streaming().await);
}

#[tokio::test]
async fn start_while_running_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = AudioProducer::new(Arc::clone(&registry), fixture_track(&dir), 128_000);

    producer.start_streaming().await.unwrap();
    producer.start_streaming().await.unwrap();
    assert!(producer.is_streaming().await);

    producer.stop_streaming().await;
}

#[tokio::test]
async fn stop_without_start_is_a_noop() {
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = AudioProducer::new(registry, "does-not-matter.mp3", 128_000);

    producer.stop_streaming().await;
    assert!(!producer.is_streaming().await);
}

#[tokio::test]
async fn start_with_missing_track_fails_with_not_found() {
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = AudioProducer::new(registry, "/no/such/track.mp3", 128_000);

    let err = producer.start_streaming().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn command_processor_drives_producer_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = Arc::new(AudioProducer::new(
        Arc::clone(&registry),
        fixture_track(&dir),
        128_000,
    ));
    let processor = RadioCommandProcessor::new(Arc::clone(&producer));

    let result = processor.execute(command("start")).await.expect("start 指令失败");
    assert_eq!(result, json!({ "result": "ok" }));
    assert!(producer.is_streaming().await);

    let result = processor.execute(command("stop")).await.expect("stop 指令失败");
    assert_eq!(result, json!({ "result": "ok" }));
    assert!(!producer.is_streaming().await);
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let registry = Arc::new(ClientStreamRegistry::new());
    let producer = Arc::new(AudioProducer::new(registry, "unused.mp3", 128_000));
    let processor = RadioCommandProcessor::new(producer);

    let err = processor.execute(command("fly")).await.unwrap_err();
    assert!(!err.is_not_found());
}
