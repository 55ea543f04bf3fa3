//! 直播音频生产者
//!
//! 以节流速率循环读取兜底曲目，并把数据块广播给所有
//! 已接入的消费者。转码管线不在本 crate 范围内，生产者
//! 直接分发磁盘上的 MP3 数据。

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{RadioError, RadioResult};
use crate::server::client_registry::ClientStreamRegistry;
use crate::utils::logger::{debug, info, warn};

/// 节流周期
const THROTTLE_TICK: Duration = Duration::from_millis(100);

/// 直播流生产者
pub struct AudioProducer {
    registry: Arc<ClientStreamRegistry>,
    fallback_track: PathBuf,
    bit_rate: u64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AudioProducer {
    pub fn new(
        registry: Arc<ClientStreamRegistry>,
        fallback_track: impl Into<PathBuf>,
        bit_rate: u64,
    ) -> Self {
        AudioProducer {
            registry,
            fallback_track: fallback_track.into(),
            bit_rate,
            task: Mutex::new(None),
        }
    }

    /// 每个节流周期应分发的字节数
    fn chunk_size(&self) -> usize {
        let bytes_per_second = self.bit_rate / 8;
        ((bytes_per_second as u128 * THROTTLE_TICK.as_millis()) / 1000).max(1) as usize
    }

    /// 启动直播；已在播放时为无操作
    ///
    /// 曲目在启动时打开，不可读的曲目在这里报告失败，
    /// 而不是留到后台任务里才发现。
    pub async fn start_streaming(&self) -> RadioResult<()> {
        let mut task = self.task.lock().await;

        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                debug!("ℹ️ [音频生产者] 直播已在进行中");
                return Ok(());
            }
        }

        let file = tokio::fs::File::open(&self.fallback_track)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    RadioError::NotFound(self.fallback_track.display().to_string())
                } else {
                    RadioError::IoError(e)
                }
            })?;

        info!(
            "📻 [音频生产者] 开始直播: {} ({} bps)",
            self.fallback_track.display(),
            self.bit_rate
        );

        let registry = Arc::clone(&self.registry);
        let chunk_size = self.chunk_size();
        let track = self.fallback_track.clone();

        let handle = tokio::spawn(async move {
            let mut file = file;
            let mut buf = vec![0u8; chunk_size];
            let mut ticker = tokio::time::interval(THROTTLE_TICK);

            loop {
                ticker.tick().await;

                match file.read(&mut buf).await {
                    Ok(0) => {
                        // 曲目播完，从头循环
                        match tokio::fs::File::open(&track).await {
                            Ok(f) => file = f,
                            Err(e) => {
                                warn!("❌ [音频生产者] 重新打开曲目失败: {}", e);
                                break;
                            }
                        }
                    }
                    Ok(n) => {
                        registry.broadcast(Bytes::copy_from_slice(&buf[..n]));
                    }
                    Err(e) => {
                        warn!("❌ [音频生产者] 读取曲目失败: {}", e);
                        break;
                    }
                }
            }
        });

        *task = Some(handle);
        Ok(())
    }

    /// 停止直播；未在播放时为无操作
    pub async fn stop_streaming(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
            info!("🛑 [音频生产者] 直播已停止");
        }
    }

    /// 是否正在直播
    pub async fn is_streaming(&self) -> bool {
        let task = self.task.lock().await;
        task.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// 当前监听人数（来自注册表）
    pub fn listener_count(&self) -> usize {
        self.registry.listener_count()
    }
}
