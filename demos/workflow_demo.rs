//! MedScan会话流程演示程序
//!
//! 展示视图状态机、登录登出和会话登记表

use anyhow::Result;
use medscan_core::{AnalysisResult, AppView, Diagnosis, Urgency};
use medscan_workflow::{
    AcceptAllVerifier, AppEvent, AppState, CredentialVerifier, Credentials, ViewStateMachine,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    info!("🚀 启动MedScan会话流程演示");

    let machine = ViewStateMachine::new();
    for view in ViewStateMachine::get_all_views() {
        info!("   {:?} 可用事件: {:?}", view, machine.get_possible_events(view));
    }

    let mut state = AppState::new();

    // 未登录访问工作台会被重定向到登录页
    state.dispatch(&machine, AppEvent::Navigate(AppView::Dashboard))?;
    info!("📋 未登录访问工作台 -> {:?}", state.view);

    let user = AcceptAllVerifier
        .verify(&Credentials::new("grey", "password"))
        .await?;
    state.dispatch(&machine, AppEvent::LoggedIn(user))?;
    info!("✅ 登录成功 -> {:?} ({:?})", state.view, state.user.as_ref().map(|u| &u.email));

    let patient = state.patient.clone();
    state.registry.record(
        &patient,
        AnalysisResult {
            diagnosis: Diagnosis::Normal,
            confidence: 96.0,
            severity_score: 1.0,
            urgency: Urgency::Routine,
            reliability_score: 9.0,
            stage: None,
            summary: "No acute findings.".to_string(),
            findings: vec![],
            recommendations: vec!["Routine follow-up".to_string()],
            affected_area_coordinates: None,
        },
    );
    state.reset_patient();
    info!("   登记表: {} 条，新患者编号 {}", state.registry.len(), state.patient.id);

    state.dispatch(&machine, AppEvent::ToggleTheme)?;
    state.dispatch(&machine, AppEvent::LoggedOut)?;
    info!(
        "👋 登出 -> {:?}，主题 {:?}，登记表保留 {} 条",
        state.view,
        state.theme,
        state.registry.len()
    );

    info!("✅ 会话流程演示完成");
    Ok(())
}
