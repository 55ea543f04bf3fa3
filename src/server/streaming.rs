//! 流式响应支持
//!
//! 提供统一的响应体类型、响应构建器，以及把 AsyncRead 源
//! 接到响应体上的显式背压管道。

use bytes::Bytes;
use futures_util::Stream;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper::{Response, StatusCode};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::RadioResult;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 统一的响应体类型：定长与流式响应共用
pub type StreamingBody = BoxBody<Bytes, BoxError>;

/// 管道单次读取的块大小
const PIPE_CHUNK_SIZE: usize = 64 * 1024;

/// 管道通道容量
///
/// 有界通道让响应端的背压传导回读取侧：
/// 消费慢时 send 挂起，读取随之暂停。
const PIPE_CHANNEL_CAPACITY: usize = 8;

/// 空响应体
pub fn empty_body() -> StreamingBody {
    BoxBody::new(Empty::<Bytes>::new().map_err(|never| -> BoxError { match never {} }))
}

/// 定长响应体
pub fn full_body(data: impl Into<Bytes>) -> StreamingBody {
    BoxBody::new(Full::new(data.into()).map_err(|never| -> BoxError { match never {} }))
}

/// 把一个字节源接成响应体
///
/// 读一块、等响应端收下、再读下一块，直到源 EOF；
/// 响应端关闭时终止读取侧，源随任务结束一起释放。
/// 读取出错时以错误帧结束响应体，不会静默截断。
pub fn body_from_reader<R>(mut reader: R) -> StreamingBody
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel::<Result<Frame<Bytes>, BoxError>>(PIPE_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut buf = vec![0u8; PIPE_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = Bytes::copy_from_slice(&buf[..n]);
                    if tx.send(Ok(Frame::data(chunk))).await.is_err() {
                        // 响应端已消失，终止读取侧
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(Box::new(e) as BoxError)).await;
                    break;
                }
            }
        }
    });

    BoxBody::new(StreamBody::new(ReceiverStream::new(rx)))
}

/// 流式响应构建器
pub struct StreamingResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<StreamingBody>,
}

impl StreamingResponse {
    pub fn new() -> Self {
        StreamingResponse {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 用一个数据帧流作为响应体
    pub fn stream<S>(self, stream: S) -> Self
    where
        S: Stream<Item = Result<Frame<Bytes>, BoxError>> + Send + Sync + 'static,
    {
        self.body(BoxBody::new(StreamBody::new(stream)))
    }

    pub fn body(mut self, body: StreamingBody) -> Self {
        self.body = Some(body);
        self
    }

    /// 构建最终响应；未设置响应体时为空体
    pub fn build(self) -> RadioResult<Response<StreamingBody>> {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = self.body.unwrap_or_else(empty_body);
        Ok(builder.body(body)?)
    }
}

impl Default for StreamingResponse {
    fn default() -> Self {
        Self::new()
    }
}
