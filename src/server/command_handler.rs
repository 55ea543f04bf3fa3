//! 控制指令处理
//!
//! 定义指令载荷与处理器接口，并提供把 start/stop 映射到
//! 直播生产者的默认实现。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{RadioError, RadioResult};
use crate::server::audio_producer::AudioProducer;
use crate::utils::logger::info;

/// 控制指令载荷
///
/// `command` 字段必填，其余旁路字段原样保留在 `extra` 中。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandPayload {
    pub command: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// 指令处理器
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    /// 执行一条控制指令，返回可序列化的结果
    async fn execute(&self, payload: CommandPayload) -> RadioResult<Value>;
}

/// 默认指令处理器：驱动直播生产者
pub struct RadioCommandProcessor {
    producer: Arc<AudioProducer>,
}

impl RadioCommandProcessor {
    pub fn new(producer: Arc<AudioProducer>) -> Self {
        RadioCommandProcessor { producer }
    }
}

#[async_trait]
impl CommandProcessor for RadioCommandProcessor {
    async fn execute(&self, payload: CommandPayload) -> RadioResult<Value> {
        let command = payload.command.to_lowercase();

        if command.contains("start") {
            info!("▶️ [指令处理] 开始直播");
            self.producer.start_streaming().await?;
            return Ok(json!({ "result": "ok" }));
        }

        if command.contains("stop") {
            info!("⏹️ [指令处理] 停止直播");
            self.producer.stop_streaming().await;
            return Ok(json!({ "result": "ok" }));
        }

        Err(RadioError::CommandError(format!(
            "未知指令: {}",
            payload.command
        )))
    }
}
