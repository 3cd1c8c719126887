//! # MedScan工作流模块
//!
//! 提供会话内的分析流程管理功能，包括：
//! - 视图状态机：LANDING → LOGIN → DASHBOARD，未登录不可进入 DASHBOARD
//! - 凭据校验：可替换的 `CredentialVerifier` 接口
//! - 会话登记表：内存中的分析记录，按时间倒序
//! - 连通性检测：发起分析前的提示性检查
//! - 分析编排：编码、请求、解析和登记的完整流程

pub mod analyzer;
pub mod auth;
pub mod connectivity;
pub mod registry;
pub mod session;
pub mod state_machine;

// 重新导出主要类型
pub use analyzer::ScanAnalyzer;
pub use auth::{AcceptAllVerifier, CredentialVerifier, Credentials};
pub use connectivity::{ConnectivityProbe, StaticConnectivity, TcpConnectivity};
pub use registry::PatientRegistry;
pub use session::{AppEvent, AppState, SessionSummary};
pub use state_machine::{ViewEvent, ViewStateMachine};
