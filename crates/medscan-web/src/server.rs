//! Web服务器

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use medscan_workflow::{CredentialVerifier, ScanAnalyzer, ViewStateMachine};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{
    end_session_handler, login_handler, logout_handler, require_login, session_middleware,
    SessionStore,
};
use crate::handlers::{
    analyze, api_root, get_patient, get_registry, get_session, health, navigate, put_patient,
    reset_patient, toggle_theme,
};

/// 路由共享状态
#[derive(Clone)]
pub struct WebState {
    pub sessions: SessionStore,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub analyzer: Arc<ScanAnalyzer>,
    pub machine: Arc<ViewStateMachine>,
}

impl WebState {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, analyzer: ScanAnalyzer) -> Self {
        Self {
            sessions: SessionStore::new(),
            verifier,
            analyzer: Arc::new(analyzer),
            machine: Arc::new(ViewStateMachine::new()),
        }
    }

    /// 替换会话表（自定义超时和容量）
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: WebState) -> Self {
        let app = create_app(state);

        Self { addr, app }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start web server: {}", e))?;

        Ok(())
    }
}

/// 创建完整路由
pub fn create_app(state: WebState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/session", delete(end_session_handler))
        .nest("/api/v1", api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        // 根路径
        .route("/", get(api_root))

        // 健康检查
        .route("/health", get(health))

        // 登录（无需令牌）
        .route("/auth/login", post(login_handler))

        // 需要会话令牌的路由
        .merge(protected)
        .with_state(state)

        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// API v1 路由
fn api_routes() -> Router<WebState> {
    Router::new()
        .route("/", get(api_root))
        .route("/session", get(get_session))
        .route("/navigate", post(navigate))
        .route("/theme", post(toggle_theme))
        .merge(dashboard_routes())
}

/// 工作台数据路由，要求已登录
fn dashboard_routes() -> Router<WebState> {
    Router::new()
        .route("/patient", get(get_patient).put(put_patient))
        .route("/patient/reset", post(reset_patient))
        .route("/registry", get(get_registry))
        // 本地不限制上传大小
        .route("/analyze", post(analyze).layer(DefaultBodyLimit::disable()))
        .route_layer(axum::middleware::from_fn(require_login))
}
