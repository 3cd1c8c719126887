//! 核心数据模型定义

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result as ScanResult, ScanError, INCOMPLETE_PATIENT_MESSAGE};
use crate::utils::{generate_patient_id, is_valid_patient_id};

/// 性别枚举
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

/// 患者基本信息（表单草稿）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub id: String,       // PT-<0..9999>
    pub name: String,     // 患者姓名
    pub age: String,      // 年龄（自由文本）
    pub gender: Gender,   // 性别
    pub symptoms: String, // 症状描述
    pub history: String,  // 既往史
}

impl PatientDetails {
    /// 创建空白草稿，生成新的患者编号
    pub fn blank() -> Self {
        Self {
            id: generate_patient_id(),
            name: String::new(),
            age: String::new(),
            gender: Gender::default(),
            symptoms: String::new(),
            history: String::new(),
        }
    }

    /// 提交前校验：编号格式合法，姓名和年龄不能为空
    pub fn ensure_complete(&self) -> ScanResult<()> {
        if !is_valid_patient_id(&self.id) {
            return Err(ScanError::Validation(format!(
                "Invalid patient id `{}`",
                self.id
            )));
        }
        if self.name.trim().is_empty() || self.age.trim().is_empty() {
            return Err(ScanError::Validation(INCOMPLETE_PATIENT_MESSAGE.to_string()));
        }
        Ok(())
    }
}

impl Default for PatientDetails {
    fn default() -> Self {
        Self::blank()
    }
}

/// 诊断结论
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Diagnosis {
    Normal,
    Benign,
    Malignant,
    Uncertain,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 4] = [
        Diagnosis::Normal,
        Diagnosis::Benign,
        Diagnosis::Malignant,
        Diagnosis::Uncertain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Benign => "Benign",
            Self::Malignant => "Malignant",
            Self::Uncertain => "Uncertain",
        }
    }
}

impl TryFrom<&str> for Diagnosis {
    type Error = ScanError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == value)
            .ok_or_else(|| ScanError::MalformedResponse(format!("unknown diagnosis `{}`", value)))
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 紧急程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Routine,     // 常规
    #[serde(rename = "Semi-Urgent")]
    SemiUrgent,  // 次紧急
    Urgent,      // 紧急
    Critical,    // 危急
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Routine,
        Urgency::SemiUrgent,
        Urgency::Urgent,
        Urgency::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routine => "Routine",
            Self::SemiUrgent => "Semi-Urgent",
            Self::Urgent => "Urgent",
            Self::Critical => "Critical",
        }
    }
}

impl TryFrom<&str> for Urgency {
    type Error = ScanError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == value)
            .ok_or_else(|| ScanError::MalformedResponse(format!("unknown urgency `{}`", value)))
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 病灶区域（热力图圆心与半径，均为百分比）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AffectedArea {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

/// AI分析结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub diagnosis: Diagnosis,
    pub confidence: f64,        // 0-100
    pub severity_score: f64,    // 1-10
    pub urgency: Urgency,
    pub reliability_score: f64, // 1-10，影像质量可信度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub summary: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_area_coordinates: Option<AffectedArea>,
}

impl AnalysisResult {
    /// 严重程度分级
    pub fn severity_band(&self) -> SeverityBand {
        SeverityBand::from_score(self.severity_score)
    }
}

/// 严重程度分级，用于界面着色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Low,
    Moderate,
    High,
}

impl SeverityBand {
    pub fn from_score(score: f64) -> Self {
        if score <= 3.0 {
            SeverityBand::Low
        } else if score <= 6.0 {
            SeverityBand::Moderate
        } else {
            SeverityBand::High
        }
    }
}

/// 会话登记表中的一条分析记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub patient: PatientDetails,
    pub timestamp: DateTime<Utc>,
    pub result: AnalysisResult,
}

impl PatientRecord {
    /// 本地时间 `HH:MM` 格式
    pub fn display_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Admin,
}

/// 登录用户
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub email: String,
}

/// 应用视图
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppView {
    Landing,
    Login,
    Dashboard,
}

/// 界面主题
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
