//! 错误类型定义
//!
//! 分发器的状态码映射依赖 NotFound 与其余失败的区分，
//! 因此"资源不存在"必须是独立变体而不是字符串约定。

use std::io;
use thiserror::Error;

/// crate 级统一结果类型
pub type RadioResult<T> = Result<T, RadioError>;

#[derive(Debug, Error)]
pub enum RadioError {
    /// 资源不存在（路由未命中之外的查找失败）
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 底层 IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] io::Error),

    /// 请求格式非法（无法解析的请求体等）
    #[error("非法请求: {0}")]
    InvalidRequest(String),

    /// 配置加载或解析失败
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 控制指令执行失败
    #[error("指令执行失败: {0}")]
    CommandError(String),

    /// JSON 编解码失败
    #[error("JSON 处理失败: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP 响应构建失败
    #[error("HTTP 响应构建失败: {0}")]
    HttpError(#[from] hyper::http::Error),
}

impl RadioError {
    /// 判断是否属于"资源不存在"语义
    ///
    /// 分发器据此决定返回 404 还是 500。
    pub fn is_not_found(&self) -> bool {
        match self {
            RadioError::NotFound(_) => true,
            RadioError::IoError(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
