//! 提示词模板

use medscan_core::{Gender, PatientDetails};

/// 固定的放射科指令，`{patient_context}` 处插入患者上下文
const INSTRUCTION_TEMPLATE: &str = "\
You are an expert radiologist and oncologist AI assistant.
Analyze this chest X-ray or CT scan image for signs of lung cancer or other pulmonary pathologies.
{patient_context}

Return a purely JSON response.

If the image is NOT a medical lung scan, set diagnosis to 'Uncertain' and confidence to 0.

Identify potential risk areas. If you find a potential anomaly, estimate its relative position (x,y from 0-100%) and approximate radius (r from 0-100%) for a heatmap visualization.

Metrics to calculate:
- Severity Score (1-10): Based on lesion size, irregularity, and spread.
- Urgency: Routine (normal), Semi-Urgent (minor findings), Urgent (suspicious nodules), Critical (large masses/metastasis).
- Reliability Score (1-10): Rate the image quality/clarity. Low score if blurry or bad artifacting.
";

/// 提示词中使用的患者上下文
#[derive(Debug, Clone, PartialEq)]
pub struct PatientContext {
    pub age: String,
    pub gender: Gender,
    pub symptoms: String,
    pub history: String,
}

impl PatientContext {
    pub fn render(&self) -> String {
        format!(
            "Patient Context: Age {}, Gender {}, Symptoms: {}, History: {}.",
            self.age, self.gender, self.symptoms, self.history
        )
    }
}

impl From<&PatientDetails> for PatientContext {
    fn from(patient: &PatientDetails) -> Self {
        Self {
            age: patient.age.clone(),
            gender: patient.gender,
            symptoms: patient.symptoms.clone(),
            history: patient.history.clone(),
        }
    }
}

/// 构造发送给模型的指令文本
pub fn build_instruction(context: Option<&PatientContext>) -> String {
    let rendered = context.map(PatientContext::render).unwrap_or_default();
    INSTRUCTION_TEMPLATE.replace("{patient_context}", &rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PatientContext {
        PatientContext {
            age: "58".to_string(),
            gender: Gender::Female,
            symptoms: "persistent cough".to_string(),
            history: "smoker, 30 pack-years".to_string(),
        }
    }

    #[test]
    fn test_render_context() {
        assert_eq!(
            context().render(),
            "Patient Context: Age 58, Gender Female, Symptoms: persistent cough, History: smoker, 30 pack-years."
        );
    }

    #[test]
    fn test_instruction_includes_context() {
        let instruction = build_instruction(Some(&context()));
        assert!(instruction.contains("Patient Context: Age 58"));
        assert!(instruction.contains("radiologist"));
        assert!(!instruction.contains("{patient_context}"));
    }

    #[test]
    fn test_instruction_without_context() {
        let instruction = build_instruction(None);
        assert!(!instruction.contains("Patient Context"));
        assert!(instruction.contains("set diagnosis to 'Uncertain' and confidence to 0"));
    }
}
