//! # MedScan分析模块
//!
//! 负责与远程AI分析服务之间的请求/响应契约，包括：
//! - 影像编码：二进制影像转换为补齐的base64文本
//! - 请求构造：固定指令、患者上下文和输出结构声明
//! - 服务客户端：Gemini `generateContent` 接口及模拟实现
//! - 响应解析：校验必填字段和枚举取值后转换为 `AnalysisResult`

pub mod client;
pub mod encoder;
pub mod parser;
pub mod prompt;
pub mod request;
pub mod schema;

pub use client::{AnalysisService, GeminiClient, GeminiConfig, MockAnalysisService};
pub use encoder::{encode_scan, EncodedImage};
pub use parser::parse_analysis;
pub use request::{AnalysisRequest, DEFAULT_MODEL};
pub use schema::{analysis_schema, Schema, REQUIRED_FIELDS};
