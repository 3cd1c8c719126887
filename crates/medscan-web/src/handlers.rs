//! HTTP处理器

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
    Extension,
};
use medscan_core::{AppView, PatientDetails, PatientRecord, ScanError, ScanFile};
use medscan_workflow::AppEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::CurrentSession;
use crate::error::ApiResult;
use crate::server::WebState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "MedScan Web API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "auth": "/auth",
            "api": "/api/v1"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 会话概要
pub async fn get_session(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    let app = session.state.lock().await;
    Json(app.summary())
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub view: AppView,
}

/// 视图导航，未登录时请求 DASHBOARD 会落到 LOGIN
pub async fn navigate(
    State(state): State<WebState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<NavigateRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut app = session.state.lock().await;
    app.dispatch(&state.machine, AppEvent::Navigate(request.view))?;
    Ok(Json(app.summary()))
}

/// 切换主题
pub async fn toggle_theme(
    State(state): State<WebState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<impl IntoResponse> {
    let mut app = session.state.lock().await;
    app.dispatch(&state.machine, AppEvent::ToggleTheme)?;
    Ok(Json(app.summary()))
}

/// 读取患者草稿
pub async fn get_patient(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    let app = session.state.lock().await;
    Json(app.patient.clone())
}

/// 替换患者草稿
pub async fn put_patient(
    Extension(session): Extension<CurrentSession>,
    Json(patient): Json<PatientDetails>,
) -> ApiResult<impl IntoResponse> {
    if let Err(e) = patient.ensure_complete() {
        warn!(patient_id = %patient.id, "Rejected patient details: {}", e);
        return Err(e.into());
    }

    let mut app = session.state.lock().await;
    app.update_patient(patient);
    Ok(Json(app.patient.clone()))
}

/// 重置患者草稿
pub async fn reset_patient(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    let mut app = session.state.lock().await;
    Json(app.reset_patient().clone())
}

/// 会话登记表
pub async fn get_registry(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    let app = session.state.lock().await;
    let records: Vec<RegistryEntry> = app.registry.iter().map(RegistryEntry::from).collect();
    Json(json!({
        "records": records,
        "total": records.len()
    }))
}

/// 登记表条目，附带本地显示时间
#[derive(Debug, Serialize)]
pub struct RegistryEntry {
    #[serde(flatten)]
    pub record: PatientRecord,
    pub display_time: String,
}

impl From<&PatientRecord> for RegistryEntry {
    fn from(record: &PatientRecord) -> Self {
        Self {
            display_time: record.display_time(),
            record: record.clone(),
        }
    }
}

/// 影像分析
///
/// multipart 表单中的 `file` 字段为影像，患者信息取自会话草稿，草稿须已填写姓名和年龄。
/// 会话锁在分析期间持有，同一会话不会并发发起两次分析。
pub async fn analyze(
    State(state): State<WebState>,
    Extension(session): Extension<CurrentSession>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let scan = read_scan(multipart).await?;

    let mut app = session.state.lock().await;
    info!(
        file = %scan.file_name,
        mime = %scan.mime_type,
        size = scan.len(),
        patient_id = %app.patient.id,
        "Analysis requested"
    );

    let patient = app.patient.clone();
    let result = state.analyzer.analyze(&scan, &patient, &mut app.registry).await?;

    Ok(Json(json!({
        "result": result,
        "patient": patient,
        "total": app.registry.len()
    })))
}

async fn read_scan(mut multipart: Multipart) -> ApiResult<ScanFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::Read(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("scan").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ScanError::Read(e.to_string()))?;

        return match ScanFile::new(file_name, mime_type, bytes.to_vec()) {
            Ok(scan) => Ok(scan),
            Err(e) => {
                warn!("Rejected upload: {}", e);
                Err(e.into())
            }
        };
    }

    Err(ScanError::Validation("Missing `file` field".to_string()).into())
}
