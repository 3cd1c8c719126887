//! 分析请求构造
//!
//! 把编码后的影像、患者上下文和固定指令组合成一次多模态请求

use serde::{Deserialize, Serialize};

use medscan_core::PatientDetails;

use crate::encoder::EncodedImage;
use crate::prompt::{build_instruction, PatientContext};
use crate::schema::{analysis_schema, Schema};

/// 默认模型
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// 一次分析请求
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub model: String,
    pub image: EncodedImage,
    pub instruction: String,
    pub schema: Schema,
}

impl AnalysisRequest {
    pub fn new(
        model: impl Into<String>,
        image: EncodedImage,
        patient: Option<&PatientDetails>,
    ) -> Self {
        let context = patient.map(PatientContext::from);
        Self {
            model: model.into(),
            image,
            instruction: build_instruction(context.as_ref()),
            schema: analysis_schema(),
        }
    }

    /// 转换为 `generateContent` 请求体
    pub fn to_wire(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: self.image.mime_type.clone(),
                            data: self.image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: self.instruction.clone(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: self.schema.clone(),
            },
        }
    }
}

/// `generateContent` 请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// 输出约束
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Schema,
}

/// 请求与响应共用的内容容器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// 文本或内联媒体片段
///
/// `untagged` 按变体顺序尝试解码
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// `generateContent` 响应体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// 第一个候选结果中所有文本片段的拼接；没有文本时返回 `None`
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
