//! 响应解析
//!
//! 把模型返回的JSON文本解析为 `AnalysisResult`，并校验必填字段和枚举取值

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use medscan_core::{AffectedArea, AnalysisResult, Diagnosis, Result, ScanError, Urgency};

/// 宽松的中间结构，所有字段都可缺失，缺失项在 `validate` 中报告
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    diagnosis: Option<Value>,
    confidence: Option<Value>,
    severity_score: Option<Value>,
    urgency: Option<Value>,
    reliability_score: Option<Value>,
    stage: Option<Value>,
    summary: Option<Value>,
    findings: Option<Value>,
    recommendations: Option<Value>,
    affected_area_coordinates: Option<Value>,
}

/// 解析模型返回的文本
///
/// 没有文本时直接返回 `NoResponse`，不尝试JSON解析。
pub fn parse_analysis(text: Option<&str>) -> Result<AnalysisResult> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ScanError::NoResponse),
    };

    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ScanError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ));
    }

    let raw: RawAnalysis = serde_json::from_value(value)?;
    let result = validate(raw)?;
    warn_out_of_domain(&result);

    debug!(
        diagnosis = %result.diagnosis,
        urgency = %result.urgency,
        findings = result.findings.len(),
        "Parsed analysis response"
    );

    Ok(result)
}

fn validate(raw: RawAnalysis) -> Result<AnalysisResult> {
    let diagnosis = Diagnosis::try_from(required_str("diagnosis", raw.diagnosis)?.as_str())?;
    let urgency = Urgency::try_from(required_str("urgency", raw.urgency)?.as_str())?;

    Ok(AnalysisResult {
        diagnosis,
        confidence: required_number("confidence", raw.confidence)?,
        severity_score: required_number("severityScore", raw.severity_score)?,
        urgency,
        reliability_score: required_number("reliabilityScore", raw.reliability_score)?,
        stage: optional_str("stage", raw.stage)?,
        summary: required_str("summary", raw.summary)?,
        findings: required_strings("findings", raw.findings)?,
        recommendations: required_strings("recommendations", raw.recommendations)?,
        affected_area_coordinates: optional_area(raw.affected_area_coordinates)?,
    })
}

fn missing(field: &str) -> ScanError {
    ScanError::MalformedResponse(format!("missing required field `{}`", field))
}

fn wrong_type(field: &str, expected: &str) -> ScanError {
    ScanError::MalformedResponse(format!("field `{}` is not {}", field, expected))
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn required_str(field: &str, value: Option<Value>) -> Result<String> {
    match present(value) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(wrong_type(field, "a string")),
        None => Err(missing(field)),
    }
}

fn optional_str(field: &str, value: Option<Value>) -> Result<Option<String>> {
    match present(value) {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(wrong_type(field, "a string")),
        None => Ok(None),
    }
}

fn required_number(field: &str, value: Option<Value>) -> Result<f64> {
    let value = present(value).ok_or_else(|| missing(field))?;
    value.as_f64().ok_or_else(|| wrong_type(field, "a number"))
}

fn required_strings(field: &str, value: Option<Value>) -> Result<Vec<String>> {
    match present(value) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(wrong_type(field, "a list of strings")),
            })
            .collect(),
        Some(_) => Err(wrong_type(field, "a list of strings")),
        None => Err(missing(field)),
    }
}

fn optional_area(value: Option<Value>) -> Result<Option<AffectedArea>> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    let Value::Object(mut fields) = value else {
        return Err(wrong_type("affectedAreaCoordinates", "an object"));
    };

    let mut coord = |name: &str| {
        let path = format!("affectedAreaCoordinates.{}", name);
        required_number(&path, fields.remove(name))
    };

    Ok(Some(AffectedArea {
        x: coord("x")?,
        y: coord("y")?,
        r: coord("r")?,
    }))
}

/// 数值超出声明范围时只记录告警，结果按原样透传
fn warn_out_of_domain(result: &AnalysisResult) {
    let checks = [
        ("confidence", result.confidence, 0.0, 100.0),
        ("severityScore", result.severity_score, 1.0, 10.0),
        ("reliabilityScore", result.reliability_score, 1.0, 10.0),
    ];
    for (field, value, min, max) in checks {
        if !(min..=max).contains(&value) {
            warn!(field, value, min, max, "Analysis value outside declared domain");
        }
    }

    if let Some(area) = &result.affected_area_coordinates {
        let in_domain = (0.0..=100.0).contains(&area.x)
            && (0.0..=100.0).contains(&area.y)
            && (0.0..=50.0).contains(&area.r);
        if !in_domain {
            warn!(x = area.x, y = area.y, r = area.r, "Affected area outside declared domain");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENIGN: &str = r#"{"diagnosis":"Benign","confidence":82,"severityScore":3,"urgency":"Routine","reliabilityScore":9,"summary":"...","findings":[],"recommendations":[]}"#;

    #[test]
    fn test_parse_benign_without_optionals() {
        let result = parse_analysis(Some(BENIGN)).unwrap();
        assert_eq!(result.diagnosis, Diagnosis::Benign);
        assert_eq!(result.confidence, 82.0);
        assert_eq!(result.urgency, Urgency::Routine);
        assert!(result.stage.is_none());
        assert!(result.affected_area_coordinates.is_none());
    }

    #[test]
    fn test_parse_malignant_with_optionals() {
        let text = r#"{
            "diagnosis": "Malignant",
            "confidence": 74.5,
            "severityScore": 8,
            "urgency": "Urgent",
            "reliabilityScore": 7,
            "stage": "Stage II",
            "summary": "Spiculated mass in the right upper lobe.",
            "findings": ["3.1 cm spiculated nodule", "Hilar lymphadenopathy"],
            "recommendations": ["Contrast CT", "PET-CT", "Biopsy"],
            "affectedAreaCoordinates": {"x": 35, "y": 28, "r": 9}
        }"#;
        let result = parse_analysis(Some(text)).unwrap();
        assert_eq!(result.stage.as_deref(), Some("Stage II"));
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.recommendations[2], "Biopsy");
        assert_eq!(
            result.affected_area_coordinates,
            Some(AffectedArea { x: 35.0, y: 28.0, r: 9.0 })
        );
    }

    #[test]
    fn test_null_optionals_are_absent() {
        let text = BENIGN.replace(
            "\"findings\"",
            "\"stage\":null,\"affectedAreaCoordinates\":null,\"findings\"",
        );
        let result = parse_analysis(Some(text.as_str())).unwrap();
        assert!(result.stage.is_none());
        assert!(result.affected_area_coordinates.is_none());
    }

    #[test]
    fn test_empty_text_is_no_response() {
        assert!(matches!(parse_analysis(Some("")), Err(ScanError::NoResponse)));
        assert!(matches!(parse_analysis(Some("  \n")), Err(ScanError::NoResponse)));
        assert!(matches!(parse_analysis(None), Err(ScanError::NoResponse)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(parse_analysis(Some("not json")), Err(ScanError::Parse(_))));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        for field in crate::schema::REQUIRED_FIELDS {
            let mut value: Value = serde_json::from_str(BENIGN).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let err = parse_analysis(Some(value.to_string().as_str())).unwrap_err();
            match err {
                ScanError::MalformedResponse(msg) => assert!(msg.contains(field), "{}", msg),
                other => panic!("unexpected error for {}: {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_enum_outside_domain_is_malformed() {
        let text = BENIGN.replace("\"Benign\"", "\"Probably fine\"");
        assert!(matches!(
            parse_analysis(Some(text.as_str())),
            Err(ScanError::MalformedResponse(_))
        ));

        let text = BENIGN.replace("\"Routine\"", "\"Whenever\"");
        assert!(matches!(
            parse_analysis(Some(text.as_str())),
            Err(ScanError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let text = BENIGN.replace("\"confidence\":82", "\"confidence\":\"high\"");
        assert!(matches!(
            parse_analysis(Some(text.as_str())),
            Err(ScanError::MalformedResponse(_))
        ));

        let text = BENIGN.replace("\"findings\":[]", "\"findings\":[1,2]");
        assert!(matches!(
            parse_analysis(Some(text.as_str())),
            Err(ScanError::MalformedResponse(_))
        ));

        let text = BENIGN.replace(
            "\"findings\"",
            "\"affectedAreaCoordinates\":{\"x\":10},\"findings\"",
        );
        assert!(matches!(
            parse_analysis(Some(text.as_str())),
            Err(ScanError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(parse_analysis(Some("[1,2]")), Err(ScanError::MalformedResponse(_))));
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let text = BENIGN.replace("\"confidence\":82", "\"confidence\":140");
        let result = parse_analysis(Some(text.as_str())).unwrap();
        assert_eq!(result.confidence, 140.0);
    }
}
