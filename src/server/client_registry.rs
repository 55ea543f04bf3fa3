//! 客户端流注册表
//!
//! 跟踪当前接入直播流的所有消费者：接入、断开时移除、
//! 向全体广播。广播过程中允许并发接入和移除，单个消费者
//! 的发送失败不影响其他消费者。

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use dashmap::DashMap;
use futures_util::Stream;
use http_body_util::combinators::BoxBody;
use http_body_util::StreamBody;
use hyper::body::Frame;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::server::streaming::{BoxError, StreamingBody};
use crate::utils::logger::{debug, info};

type ChunkSender = mpsc::UnboundedSender<Result<Frame<Bytes>, BoxError>>;

/// 直播消费者注册表
///
/// 只存储 sender 一侧；receiver 被包进响应体后随连接走。
pub struct ClientStreamRegistry {
    /// 连接映射表：connection_id -> sender
    connections: DashMap<u64, ChunkSender>,
    next_id: AtomicU64,
    /// 生产者侧的监听计数，接入加一、真正移除时减一
    listeners: AtomicUsize,
}

impl ClientStreamRegistry {
    pub fn new() -> Self {
        ClientStreamRegistry {
            connections: DashMap::new(),
            next_id: AtomicU64::new(0),
            listeners: AtomicUsize::new(0),
        }
    }

    /// 接入一个新的直播消费者
    ///
    /// 注册后立即返回，不会挂起；返回的响应体持续打开，
    /// 直到客户端断开或服务端主动移除。响应体被丢弃
    /// （传输层断开）时触发断开钩子，保证恰好执行一次；
    /// 服务端先移除时，发送端随之关闭，响应体走到 EOF。
    pub fn attach(self: &Arc<Self>) -> (ClientConnection, StreamingBody) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        self.connections.insert(id, sender);
        self.listeners.fetch_add(1, Ordering::SeqCst);

        let connection = ClientConnection {
            id,
            registry: Arc::clone(self),
            detached: Arc::new(AtomicBool::new(false)),
        };

        info!(
            "🔗 [客户端注册表] 新消费者接入: #{} (当前 {} 个)",
            id,
            self.connections.len()
        );

        let stream = ClientBodyStream {
            inner: UnboundedReceiverStream::new(receiver),
            connection: connection.clone(),
        };
        let body = BoxBody::new(StreamBody::new(stream));
        (connection, body)
    }

    /// 向所有已接入的消费者广播一块数据
    ///
    /// 返回成功送达的消费者数量。发送失败的目标被静默移除，
    /// 不影响其余消费者的分发。
    pub fn broadcast(&self, chunk: Bytes) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();

        for entry in self.connections.iter() {
            let frame = Frame::data(chunk.clone());
            if entry.value().send(Ok(frame)).is_ok() {
                delivered += 1;
            } else {
                failed.push(*entry.key());
            }
        }

        for id in failed {
            if self.remove(id) {
                debug!("❌ [客户端注册表] 移除失效消费者: #{}", id);
            }
        }

        delivered
    }

    /// 移除连接；连接不存在时为无操作
    ///
    /// 监听计数只在连接确实存在时递减，重复移除不会把计数减穿。
    pub(crate) fn remove(&self, id: u64) -> bool {
        if self.connections.remove(&id).is_some() {
            self.listeners.fetch_sub(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// 当前接入的连接数量
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// 生产者侧可见的监听人数
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    /// 服务端主动清空所有连接
    pub fn clear(&self) {
        let count = self.connections.len();
        self.connections.clear();
        self.listeners.store(0, Ordering::SeqCst);
        info!("🧹 [客户端注册表] 清空所有连接: {} 个", count);
    }
}

impl Default for ClientStreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 一个已接入的直播消费者句柄
///
/// 生命周期只有两个状态：接入、已断开（终态）。
#[derive(Clone)]
pub struct ClientConnection {
    id: u64,
    registry: Arc<ClientStreamRegistry>,
    detached: Arc<AtomicBool>,
}

impl ClientConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 断开钩子：幂等，第二次之后的调用为无操作
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.registry.remove(self.id) {
            info!(
                "🔌 [客户端注册表] 消费者断开: #{} (剩余 {} 个)",
                self.id,
                self.registry.connection_count()
            );
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

/// 带断开钩子的响应体数据流
///
/// 响应体被丢弃即视为消费者断开，Drop 时执行 detach。
struct ClientBodyStream {
    inner: UnboundedReceiverStream<Result<Frame<Bytes>, BoxError>>,
    connection: ClientConnection,
}

impl Stream for ClientBodyStream {
    type Item = Result<Frame<Bytes>, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for ClientBodyStream {
    fn drop(&mut self) {
        self.connection.detach();
    }
}
