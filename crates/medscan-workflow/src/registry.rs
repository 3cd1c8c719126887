//! 会话登记表
//!
//! 内存中的分析记录列表，按时间倒序，会话结束即丢失

use chrono::Utc;
use medscan_core::{AnalysisResult, PatientDetails, PatientRecord};
use tracing::debug;

/// 会话内的患者分析记录
#[derive(Debug, Clone, Default)]
pub struct PatientRegistry {
    records: Vec<PatientRecord>,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录，时间戳取追加时刻，最新记录排在最前
    pub fn record(&mut self, patient: &PatientDetails, result: AnalysisResult) -> &PatientRecord {
        let record = PatientRecord {
            patient: patient.clone(),
            timestamp: Utc::now(),
            result,
        };
        debug!(
            patient_id = %record.patient.id,
            diagnosis = %record.result.diagnosis,
            "Registry record appended"
        );

        self.records.insert(0, record);
        &self.records[0]
    }

    /// 最新一条记录
    pub fn latest(&self) -> Option<&PatientRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatientRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
