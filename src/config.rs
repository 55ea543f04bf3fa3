//! 服务器配置
//!
//! 所有字段都有默认值，可整体或部分地从 TOML 文件覆盖。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RadioError, RadioResult};

/// 电台服务器配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RadioConfig {
    pub server: ServerConfig,
    pub pages: PageConfig,
    pub location: LocationConfig,
    pub stream: StreamConfig,
    pub content: ContentConfig,
}

/// 监听地址配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 页面标识符配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// 首页页面在内容根目录下的标识符
    pub home_html: String,
    /// 控制台页面在内容根目录下的标识符
    pub controller_html: String,
}

/// 跳转目标配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// `GET /` 的 302 跳转目标
    pub home: String,
}

/// 直播流配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// 无外部输入时循环播放的兜底曲目
    pub fallback_track: PathBuf,
    /// 直播分发的比特率（bps）
    pub bit_rate: u64,
}

/// 静态内容配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// 静态内容根目录
    pub dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            home_html: "home/index.html".to_string(),
            controller_html: "controller/index.html".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            home: "/home".to_string(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            fallback_track: PathBuf::from("audio/songs/conversation.mp3"),
            bit_rate: 128_000,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    /// 监听地址字符串
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RadioConfig {
    /// 从 TOML 文件加载配置
    pub fn from_toml_file(path: impl AsRef<Path>) -> RadioResult<Self> {
        let src = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&src).map_err(|e| RadioError::ConfigError(format!("配置解析失败: {}", e)))
    }
}
