//! 静态内容解析模块
//!
//! 把路径标识符解析为已打开的字节流加可选类型标签。
//! 解析失败发生在任何响应字节写出之前，分发器据此保证
//! 错误状态码不会跟在半截响应体后面。

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use lazy_static::lazy_static;
use tokio::io::AsyncRead;

use crate::error::{RadioError, RadioResult};
use crate::utils::logger::debug;

/// 扩展名未命中映射表时的默认 MIME 类型
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

lazy_static! {
    /// 扩展名 -> MIME 映射表（进程级只读）
    pub static ref CONTENT_TYPE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(".html", "text/html");
        m.insert(".css", "text/css");
        m.insert(".js", "text/javascript");
        m.insert(".json", "application/json");
        m.insert(".mp3", "audio/mpeg");
        m.insert(".png", "image/png");
        m.insert(".jpg", "image/jpeg");
        m.insert(".svg", "image/svg+xml");
        m.insert(".ico", "image/x-icon");
        m
    };
}

/// 根据扩展名查询 MIME 类型，未命中时回退默认值
pub fn content_type_for(extension: &str) -> &'static str {
    CONTENT_TYPE
        .get(extension)
        .copied()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// 一个已打开的内容流与可选的类型标签
///
/// reader 的所有权随句柄移交给响应管道，由管道负责在
/// 完成或出错时释放底层资源。
pub struct StreamHandle {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// 形如 `.html` 的扩展名标签；无法判断类型时为 None
    pub file_type: Option<String>,
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("file_type", &self.file_type)
            .finish_non_exhaustive()
    }
}

/// 内容解析器
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// 把标识符解析为可读字节流
    ///
    /// 资源不存在时必须返回 `RadioError::NotFound`，
    /// 其余失败返回对应的错误变体。
    async fn resolve(&self, identifier: &str) -> RadioResult<StreamHandle>;
}

/// 基于磁盘目录的内容解析器
pub struct DiskContentResolver {
    root: PathBuf,
}

impl DiskContentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskContentResolver { root: root.into() }
    }

    /// 规范化标识符，拒绝越出根目录的路径
    fn full_path(&self, identifier: &str) -> RadioResult<PathBuf> {
        let relative = Path::new(identifier.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                // `..`、绝对路径等一律视为不存在，不暴露目录结构
                _ => return Err(RadioError::NotFound(identifier.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentResolver for DiskContentResolver {
    async fn resolve(&self, identifier: &str) -> RadioResult<StreamHandle> {
        let path = self.full_path(identifier)?;

        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RadioError::NotFound(identifier.to_string())
            } else {
                RadioError::IoError(e)
            }
        })?;

        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(RadioError::NotFound(identifier.to_string()));
        }

        let file_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext));

        debug!("📄 [内容解析] 打开文件: {} (类型: {:?})", path.display(), file_type);

        Ok(StreamHandle {
            reader: Box::new(file),
            file_type,
        })
    }
}
