//! # MedScan Web模块
//!
//! 在工作流之上提供JSON接口：登录、视图导航、患者表单、影像上传分析和会话登记表。

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;


pub use auth::SessionStore;
pub use error::{ApiError, ApiResult};
pub use server::{create_app, WebServer, WebState};
