//! RAT Radio 电台入口服务器
//!
//! 提供一个小型的 HTTP 入口：
//! - 静态页面与任意文件的磁盘流式分发
//! - 多客户端可同时接入/断开的音频直播流
//! - 控制直播生产者的带外指令（start/stop）
//!
//! # 示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rat_radio::{build_dispatcher, run_server, RadioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     rat_radio::utils::logger::init_default();
//!
//!     let config = Arc::new(RadioConfig::default());
//!     let dispatcher = build_dispatcher(Arc::clone(&config));
//!     run_server(config, dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod utils;

pub use config::RadioConfig;
pub use error::{RadioError, RadioResult};
pub use server::{build_dispatcher, run_server, Dispatcher};
