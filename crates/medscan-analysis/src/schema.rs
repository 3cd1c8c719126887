//! 响应结构声明
//!
//! 随请求一起发送给远程模型，约束其输出格式

use serde::Serialize;
use std::collections::BTreeMap;

/// 必填字段，顺序固定
pub const REQUIRED_FIELDS: [&str; 8] = [
    "diagnosis",
    "confidence",
    "severityScore",
    "urgency",
    "reliabilityScore",
    "summary",
    "findings",
    "recommendations",
];

/// 字段类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    String,
    Number,
    Array,
}

/// 字段结构声明
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            enum_values: Vec::new(),
            nullable: None,
            properties: BTreeMap::new(),
            items: None,
            required: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self {
            enum_values: values.iter().map(|v| v.to_string()).collect(),
            ..Self::string()
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

/// 分析结果的结构声明
pub fn analysis_schema() -> Schema {
    let coordinates = Schema::object()
        .property("x", Schema::number().describe("X percentage (0-100)"))
        .property("y", Schema::number().describe("Y percentage (0-100)"))
        .property("r", Schema::number().describe("Radius percentage (0-50)"))
        .nullable();

    Schema::object()
        .property(
            "diagnosis",
            Schema::one_of(&["Normal", "Benign", "Malignant", "Uncertain"]),
        )
        .property(
            "confidence",
            Schema::number().describe("AI Confidence percentage (0-100)"),
        )
        .property("severityScore", Schema::number().describe("Severity scale 1-10"))
        .property(
            "urgency",
            Schema::one_of(&["Routine", "Semi-Urgent", "Urgent", "Critical"]),
        )
        .property(
            "reliabilityScore",
            Schema::number().describe("Image quality/Reliability score 1-10"),
        )
        .property(
            "stage",
            Schema::string()
                .describe("Estimated stage if malignant (e.g., Stage I, Stage II)")
                .nullable(),
        )
        .property(
            "summary",
            Schema::string().describe("Brief summary of the analysis (max 2 sentences)"),
        )
        .property(
            "findings",
            Schema::array(Schema::string()).describe("List of specific radiological findings"),
        )
        .property(
            "recommendations",
            Schema::array(Schema::string()).describe("Recommended next steps for the doctor"),
        )
        .property("affectedAreaCoordinates", coordinates)
        .require(&REQUIRED_FIELDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medscan_core::{Diagnosis, Urgency};

    #[test]
    fn test_required_fields_exact() {
        let schema = analysis_schema();
        assert_eq!(
            schema.required,
            vec![
                "diagnosis",
                "confidence",
                "severityScore",
                "urgency",
                "reliabilityScore",
                "summary",
                "findings",
                "recommendations"
            ]
        );
    }

    #[test]
    fn test_enum_domains_match_model() {
        let schema = analysis_schema();
        let diagnosis: Vec<&str> = Diagnosis::ALL.iter().map(|d| d.as_str()).collect();
        let urgency: Vec<&str> = Urgency::ALL.iter().map(|u| u.as_str()).collect();
        assert_eq!(schema.properties["diagnosis"].enum_values, diagnosis);
        assert_eq!(schema.properties["urgency"].enum_values, urgency);
    }

    #[test]
    fn test_optional_fields_are_nullable() {
        let schema = analysis_schema();
        assert_eq!(schema.properties["stage"].nullable, Some(true));
        assert_eq!(schema.properties["affectedAreaCoordinates"].nullable, Some(true));
        assert_eq!(schema.properties["summary"].nullable, None);
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(analysis_schema()).unwrap();
        assert_eq!(value["type"], "OBJECT");
        assert_eq!(value["properties"]["findings"]["type"], "ARRAY");
        assert_eq!(value["properties"]["findings"]["items"]["type"], "STRING");
        assert_eq!(value["properties"]["urgency"]["enum"][1], "Semi-Urgent");
        assert!(value["properties"]["confidence"].get("enum").is_none());
        assert_eq!(value["required"].as_array().unwrap().len(), 8);
    }
}
