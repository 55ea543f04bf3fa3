//! 客户端流注册表测试

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;

use rat_radio::server::client_registry::ClientStreamRegistry;
use rat_radio::server::streaming::StreamingBody;

/// 读取下一个数据帧；流结束时返回 None
async fn next_chunk(body: &mut StreamingBody) -> Option<Bytes> {
    match body.frame().await {
        Some(Ok(frame)) => frame.into_data().ok(),
        Some(Err(_)) | None => None,
    }
}

#[tokio::test]
async fn broadcast_reaches_all_attached_clients() {
    let registry = Arc::new(ClientStreamRegistry::new());

    let (_c0, mut b0) = registry.attach();
    let (_c1, mut b1) = registry.attach();
    let (_c2, mut b2) = registry.attach();

    assert_eq!(registry.connection_count(), 3);
    assert_eq!(registry.listener_count(), 3);

    let delivered = registry.broadcast(Bytes::from_static(b"chunk-1"));
    assert_eq!(delivered, 3);

    for body in [&mut b0, &mut b1, &mut b2] {
        let chunk = next_chunk(body).await.expect("消费者未收到广播数据");
        assert_eq!(chunk.as_ref(), b"chunk-1");
    }
}

#[tokio::test]
async fn detached_client_stops_receiving_while_others_continue() {
    let registry = Arc::new(ClientStreamRegistry::new());

    let (_c0, mut b0) = registry.attach();
    let (c1, mut b1) = registry.attach();
    let (_c2, mut b2) = registry.attach();

    c1.detach();
    assert_eq!(registry.connection_count(), 2);
    assert_eq!(registry.listener_count(), 2);

    let delivered = registry.broadcast(Bytes::from_static(b"after-detach"));
    assert_eq!(delivered, 2);

    // 被移除的消费者的流走到 EOF，其他消费者照常收数
    assert!(next_chunk(&mut b1).await.is_none());
    assert_eq!(
        next_chunk(&mut b0).await.expect("在线消费者应收到数据").as_ref(),
        b"after-detach"
    );
    assert_eq!(
        next_chunk(&mut b2).await.expect("在线消费者应收到数据").as_ref(),
        b"after-detach"
    );
}

#[tokio::test]
async fn detach_twice_is_a_noop() {
    let registry = Arc::new(ClientStreamRegistry::new());

    let (connection, _body) = registry.attach();
    assert_eq!(registry.listener_count(), 1);

    connection.detach();
    assert!(connection.is_detached());
    assert_eq!(registry.listener_count(), 0);

    // 第二次断开不得报错，也不得把计数减穿
    connection.detach();
    assert_eq!(registry.listener_count(), 0);
    assert_eq!(registry.connection_count(), 0);
}

#[tokio::test]
async fn vanished_consumer_is_pruned_on_broadcast() {
    let registry = Arc::new(ClientStreamRegistry::new());

    let (_c0, mut b0) = registry.attach();
    let (_c1, b1) = registry.attach();

    // 消费者消失（响应体被丢弃），下一次广播将其静默剔除
    drop(b1);
    let delivered = registry.broadcast(Bytes::from_static(b"survivors-only"));
    assert_eq!(delivered, 1);

    assert_eq!(
        next_chunk(&mut b0).await.expect("在线消费者应收到数据").as_ref(),
        b"survivors-only"
    );

    // 剔除可能由响应体析构或广播失败路径完成，最终连接数应为 1
    let mut pruned = false;
    for _ in 0..200 {
        if registry.connection_count() == 1 {
            pruned = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(pruned, "失效消费者未被剔除");
}

#[tokio::test]
async fn clear_removes_all_connections() {
    let registry = Arc::new(ClientStreamRegistry::new());

    let (_c0, _b0) = registry.attach();
    let (_c1, _b1) = registry.attach();
    assert_eq!(registry.connection_count(), 2);

    registry.clear();
    assert_eq!(registry.connection_count(), 0);
    assert_eq!(registry.listener_count(), 0);
    assert_eq!(registry.broadcast(Bytes::from_static(b"nobody")), 0);
}
