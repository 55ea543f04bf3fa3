//! RAT Radio 服务器模块
//!
//! 提供基于 hyper 的电台入口：连接接入循环、请求分发与
//! 直播流生命周期管理。

use std::convert::Infallible;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::TcpListener;
use tokio::signal;

pub mod audio_producer;
pub mod client_registry;
pub mod command_handler;
pub mod file_handler;
pub mod http_request;
pub mod router;
pub mod streaming;

pub use audio_producer::AudioProducer;
pub use client_registry::{ClientConnection, ClientStreamRegistry};
pub use command_handler::{CommandPayload, CommandProcessor, RadioCommandProcessor};
pub use file_handler::{ContentResolver, DiskContentResolver, StreamHandle};
pub use http_request::HttpRequest;
pub use router::Dispatcher;
pub use streaming::{StreamingBody, StreamingResponse};

use crate::config::RadioConfig;
use crate::error::{RadioError, RadioResult};
use crate::utils::logger::{debug, error, info};

/// 按配置装配一个完整的分发器
///
/// 磁盘内容解析器 + 客户端注册表 + 默认指令处理器。
/// 需要替换协作方（例如测试）时直接使用 `Dispatcher::new`。
pub fn build_dispatcher(config: Arc<RadioConfig>) -> Arc<Dispatcher> {
    let registry = Arc::new(ClientStreamRegistry::new());
    let resolver = Arc::new(DiskContentResolver::new(config.content.dir.clone()));
    let producer = Arc::new(AudioProducer::new(
        Arc::clone(&registry),
        config.stream.fallback_track.clone(),
        config.stream.bit_rate,
    ));
    let processor = Arc::new(RadioCommandProcessor::new(producer));

    Arc::new(Dispatcher::new(config, resolver, registry, processor))
}

/// 启动服务器主循环
///
/// 每个入站连接一个任务，Ctrl+C 触发退出。
pub async fn run_server(config: Arc<RadioConfig>, dispatcher: Arc<Dispatcher>) -> RadioResult<()> {
    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr).await.map_err(RadioError::IoError)?;

    info!("🚀 RAT Radio 服务器启动: http://{}", addr);

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let server_loop = async {
        loop {
            let (stream, remote_addr) = listener.accept().await.map_err(RadioError::IoError)?;
            debug!("🔗 [服务端] 新连接: {}", remote_addr);

            let dispatcher = Arc::clone(&dispatcher);

            tokio::task::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let dispatcher = Arc::clone(&dispatcher);
                    async move {
                        let response = match HttpRequest::from_hyper_request(req).await {
                            Ok(http_req) => dispatcher.dispatch(http_req).await,
                            Err(e) => {
                                error!("❌ [服务端] 请求解析失败: {}", e);
                                let mut response = Response::new(streaming::empty_body());
                                *response.status_mut() = StatusCode::BAD_REQUEST;
                                response
                            }
                        };
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = AutoBuilder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await
                {
                    let err_str = err.to_string();
                    if err_str.contains("IncompleteMessage") || err_str.contains("connection closed") {
                        debug!("客户端断开连接: {:?}", err);
                    } else {
                        error!("连接处理失败: {}: {}", remote_addr, err_str);
                    }
                }
            });
        }
    };

    tokio::select! {
        result = server_loop => result,
        _ = ctrl_c => {
            info!("🛑 收到 Ctrl+C 信号，正在关闭服务器...");
            Ok(())
        }
    }
}
