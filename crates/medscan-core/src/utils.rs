//! 通用工具函数

use rand::Rng;

/// 生成患者编号，格式为 `PT-<0..9999>`
pub fn generate_patient_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..10000);
    format!("PT-{}", n)
}

/// 验证患者编号格式
pub fn is_valid_patient_id(id: &str) -> bool {
    match id.strip_prefix("PT-") {
        Some(num) => !num.is_empty() && num.len() <= 4 && num.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// 首字母大写，用于把用户名格式化为显示名称（"jdoe" -> "Jdoe"）
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_patient_id() {
        for _ in 0..100 {
            let id = generate_patient_id();
            assert!(is_valid_patient_id(&id), "bad id {}", id);
        }
    }

    #[test]
    fn test_is_valid_patient_id() {
        assert!(is_valid_patient_id("PT-0"));
        assert!(is_valid_patient_id("PT-9999"));
        assert!(!is_valid_patient_id("PT-"));
        assert!(!is_valid_patient_id("PT-10000"));
        assert!(!is_valid_patient_id("PAT001"));
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("jdoe"), "Jdoe");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("émile"), "Émile");
    }
}
