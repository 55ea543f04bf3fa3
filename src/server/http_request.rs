//! 轻量级 HTTP 请求表示
//!
//! 在连接层把 hyper 请求收拢为自持有结构，分发器处理时
//! 不再依赖底层连接的生命周期。

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Uri};

use crate::error::{RadioError, RadioResult};

#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpRequest {
    /// 直接构造请求（主要用于测试）
    pub fn new(method: Method, uri: Uri, body: Bytes) -> Self {
        HttpRequest {
            method,
            uri,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// 从 hyper 请求转换，聚合整个请求体
    ///
    /// 读取请求体会挂起到请求流结束；GET 等无体请求立即完成。
    pub async fn from_hyper_request(req: Request<Incoming>) -> RadioResult<Self> {
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| RadioError::InvalidRequest(format!("读取请求体失败: {}", e)))?
            .to_bytes();

        Ok(HttpRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    /// 请求路径（不含查询串）
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}
