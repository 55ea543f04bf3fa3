//! 日志模块
//!
//! 对 rat_logger 的薄封装，crate 内统一从这里引入日志宏。

pub use rat_logger::{debug, error, info, trace, warn};

use rat_logger::handler::term::TermConfig;
use rat_logger::{LevelFilter, LoggerBuilder};

/// 初始化默认终端日志
///
/// 重复初始化时静默忽略，便于在测试与示例中随意调用。
pub fn init_default() {
    let _ = LoggerBuilder::new()
        .with_level(LevelFilter::Debug)
        .add_terminal_with_config(TermConfig::default())
        .init();
}
