//! 请求分发器
//!
//! 按 (HTTP 方法, 路径) 的有序路由表选择行为，自上而下
//! 首个命中生效，兜底返回 404。所有协作方的失败都在这里
//! 转换为 HTTP 状态码，绝不向连接层抛出错误。

use std::sync::Arc;

use hyper::{Method, Response, StatusCode};

use crate::config::RadioConfig;
use crate::error::RadioResult;
use crate::server::client_registry::ClientStreamRegistry;
use crate::server::command_handler::{CommandPayload, CommandProcessor};
use crate::server::file_handler::{content_type_for, ContentResolver};
use crate::server::http_request::HttpRequest;
use crate::server::streaming::{body_from_reader, empty_body, full_body, StreamingBody, StreamingResponse};
use crate::utils::logger::{debug, warn};

/// 路由匹配模式
#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    /// 精确路径匹配
    Exact(&'static str),
    /// 兜底匹配任意路径
    CatchAll,
}

/// 路由键：HTTP 方法 + 路径模式
#[derive(Debug, Clone)]
struct RouteKey {
    method: Method,
    pattern: RoutePattern,
}

impl RouteKey {
    fn new(method: Method, pattern: RoutePattern) -> Self {
        RouteKey { method, pattern }
    }

    /// 匹配请求的 (方法, 路径)；查询串已在上游剥离
    fn matches(&self, method: &Method, path: &str) -> bool {
        if &self.method != method {
            return false;
        }
        match self.pattern {
            RoutePattern::Exact(p) => p == path,
            RoutePattern::CatchAll => true,
        }
    }
}

/// 路由对应的行为
#[derive(Debug, Clone, Copy)]
enum RouteAction {
    /// 302 跳转到首页
    RedirectHome,
    /// 首页页面流
    HomePage,
    /// 控制台页面流
    ControllerPage,
    /// 接入直播流
    StreamAttach,
    /// 执行控制指令
    Command,
    /// 通用文件流（兜底）
    FileStream,
}

/// 请求分发器
pub struct Dispatcher {
    /// 按优先级排列的路由表，避免重叠模式下的隐式优先级问题
    routes: Vec<(RouteKey, RouteAction)>,
    config: Arc<RadioConfig>,
    resolver: Arc<dyn ContentResolver>,
    registry: Arc<ClientStreamRegistry>,
    processor: Arc<dyn CommandProcessor>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<RadioConfig>,
        resolver: Arc<dyn ContentResolver>,
        registry: Arc<ClientStreamRegistry>,
        processor: Arc<dyn CommandProcessor>,
    ) -> Self {
        let routes = vec![
            (
                RouteKey::new(Method::GET, RoutePattern::Exact("/")),
                RouteAction::RedirectHome,
            ),
            (
                RouteKey::new(Method::GET, RoutePattern::Exact("/home")),
                RouteAction::HomePage,
            ),
            (
                RouteKey::new(Method::GET, RoutePattern::Exact("/controller")),
                RouteAction::ControllerPage,
            ),
            (
                RouteKey::new(Method::GET, RoutePattern::Exact("/stream")),
                RouteAction::StreamAttach,
            ),
            (
                RouteKey::new(Method::POST, RoutePattern::Exact("/controller")),
                RouteAction::Command,
            ),
            // 通用文件路由必须排在所有具名路由之后
            (
                RouteKey::new(Method::GET, RoutePattern::CatchAll),
                RouteAction::FileStream,
            ),
        ];

        Dispatcher {
            routes,
            config,
            resolver,
            registry,
            processor,
        }
    }

    /// 分发入口：永不失败，所有错误在此映射为状态码
    pub async fn dispatch(&self, req: HttpRequest) -> Response<StreamingBody> {
        let method = req.method.clone();
        let path = req.path().to_string();

        debug!("🔍 [分发器] 处理请求: {} {}", method, path);

        let action = self
            .routes
            .iter()
            .find(|(key, _)| key.matches(&method, &path))
            .map(|(_, action)| *action);

        let result = match action {
            Some(RouteAction::RedirectHome) => self.handle_redirect(),
            Some(RouteAction::HomePage) => self.handle_page(&self.config.pages.home_html).await,
            Some(RouteAction::ControllerPage) => {
                self.handle_page(&self.config.pages.controller_html).await
            }
            Some(RouteAction::StreamAttach) => self.handle_stream_attach(),
            Some(RouteAction::Command) => self.handle_command(&req).await,
            Some(RouteAction::FileStream) => self.handle_file(&path).await,
            None => {
                debug!("🔍 [分发器] 未命中任何路由: {} {}", method, path);
                return error_response(StatusCode::NOT_FOUND);
            }
        };

        match result {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                debug!("🔍 [分发器] 资源不存在: {} {} ({})", method, path, e);
                error_response(StatusCode::NOT_FOUND)
            }
            Err(e) => {
                warn!("❌ [分发器] 请求处理失败: {} {} ({})", method, path, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn handle_redirect(&self) -> RadioResult<Response<StreamingBody>> {
        StreamingResponse::new()
            .status(StatusCode::FOUND)
            .with_header("Location", self.config.location.home.clone())
            .build()
    }

    /// 页面路由：忽略类型标签，直接把页面流接到响应上
    async fn handle_page(&self, identifier: &str) -> RadioResult<Response<StreamingBody>> {
        let handle = self.resolver.resolve(identifier).await?;
        StreamingResponse::new()
            .body(body_from_reader(handle.reader))
            .build()
    }

    /// 通用文件路由：有类型标签时写入映射后的 Content-Type
    async fn handle_file(&self, path: &str) -> RadioResult<Response<StreamingBody>> {
        let handle = self.resolver.resolve(path).await?;

        let mut response = StreamingResponse::new().status(StatusCode::OK);
        if let Some(file_type) = handle.file_type.as_deref() {
            response = response.with_header("Content-Type", content_type_for(file_type));
        }
        response.body(body_from_reader(handle.reader)).build()
    }

    /// 直播接入：状态行与头部先于注册确定
    fn handle_stream_attach(&self) -> RadioResult<Response<StreamingBody>> {
        let (connection, body) = self.registry.attach();
        debug!("🎧 [分发器] 直播消费者接入: #{}", connection.id());

        StreamingResponse::new()
            .status(StatusCode::OK)
            .with_header("Content-Type", "audio/mpeg")
            .with_header("Accept-Ranges", "bytes")
            .body(body)
            .build()
    }

    /// 控制指令：解析 JSON 请求体，执行后回写 JSON 结果
    async fn handle_command(&self, req: &HttpRequest) -> RadioResult<Response<StreamingBody>> {
        let payload: CommandPayload = serde_json::from_slice(&req.body)?;
        debug!("🎛️ [分发器] 执行指令: {}", payload.command);

        let result = self.processor.execute(payload).await?;
        let body = serde_json::to_string(&result)?;

        StreamingResponse::new().body(full_body(body)).build()
    }
}

/// 纯状态码响应，空响应体
fn error_response(status: StatusCode) -> Response<StreamingBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = status;
    response
}
