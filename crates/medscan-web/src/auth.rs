//! 会话与登录
//!
//! 登录成功后签发会话令牌，每个令牌对应一份独立的 `AppState`

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use medscan_core::{AppView, ScanError, User};
use medscan_workflow::{AppEvent, AppState, Credentials};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::server::WebState;

/// 单个会话的状态，分析期间独占
pub type SessionHandle = Arc<Mutex<AppState>>;

/// 默认空闲超时
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// 默认会话数上限
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// 内存会话表，进程退出即丢失
///
/// 空闲超过 `idle_timeout` 的会话在创建新会话时被清理；达到 `max_sessions`
/// 时淘汰最久未访问的会话。
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// 创建新会话
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions, now);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(token, _)| *token);
            match oldest {
                Some(token) => {
                    sessions.remove(&token);
                    debug!("Session {} evicted: capacity reached", token);
                }
                None => break,
            }
        }

        let token = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(AppState::new()));
        sessions.insert(
            token,
            SessionEntry {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        (token, handle)
    }

    /// 查找会话并刷新访问时间；已超时的会话视为不存在
    pub async fn get(&self, token: &Uuid) -> Option<SessionHandle> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get_mut(token) {
            Some(entry) if now.saturating_duration_since(entry.last_seen) <= self.idle_timeout => {
                entry.last_seen = now;
                return Some(entry.handle.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(token);
            debug!("Session {} expired", token);
        }
        None
    }

    pub async fn remove(&self, token: &Uuid) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// 清理在 `now` 时刻已空闲超时的会话，返回清理数量
    pub async fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions, now)
    }

    fn evict_idle_locked(
        &self,
        sessions: &mut HashMap<Uuid, SessionEntry>,
        now: Instant,
    ) -> usize {
        let before = sessions.len();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// 当前请求所属的会话
#[derive(Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub state: SessionHandle,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: User,
    pub view: AppView,
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t.trim()).ok())
}

/// 会话中间件
pub async fn session_middleware(
    State(state): State<WebState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ScanError::Authentication("Missing session token".to_string()))?;

    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or_else(|| ScanError::Authentication("Unknown session".to_string()))?;

    request.extensions_mut().insert(CurrentSession {
        token,
        state: session,
    });
    Ok(next.run(request).await)
}

/// 登录守卫，工作台相关路由要求会话已登录
///
/// 须位于 `session_middleware` 之内。
pub async fn require_login(request: Request, next: Next) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .cloned()
        .ok_or_else(|| ScanError::Authentication("Missing session token".to_string()))?;

    if !session.state.lock().await.is_authenticated() {
        return Err(ScanError::Authentication("Login required".to_string()).into());
    }

    Ok(next.run(request).await)
}

/// 登录处理器
///
/// 请求携带有效令牌时复用原会话，登记表得以保留。
pub async fn login_handler(
    State(state): State<WebState>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", credentials.username);

    let user = match state.verifier.verify(&credentials).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Login failed: {}", e);
            return Err(e.into());
        }
    };

    let existing = match bearer_token(&headers) {
        Some(token) => state.sessions.get(&token).await.map(|s| (token, s)),
        None => None,
    };
    let (token, session) = match existing {
        Some(found) => found,
        None => state.sessions.create().await,
    };

    let mut app = session.lock().await;
    if app.is_authenticated() {
        app.dispatch(&state.machine, AppEvent::LoggedOut)?;
    }
    app.dispatch(&state.machine, AppEvent::LoggedIn(user.clone()))?;

    Ok(Json(LoginResponse {
        token,
        user,
        view: app.view,
    }))
}

/// 登出处理器，会话保留
pub async fn logout_handler(
    State(state): State<WebState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<impl IntoResponse> {
    let mut app = session.state.lock().await;
    app.dispatch(&state.machine, AppEvent::LoggedOut)?;
    info!("Session {} logged out", session.token);

    Ok(Json(app.summary()))
}

/// 结束会话，丢弃会话内的登记表
pub async fn end_session_handler(
    State(state): State<WebState>,
    Extension(session): Extension<CurrentSession>,
) -> impl IntoResponse {
    let removed = state.sessions.remove(&session.token).await;
    info!("Session {} ended", session.token);

    Json(serde_json::json!({ "ended": removed }))
}
