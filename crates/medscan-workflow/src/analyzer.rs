//! 分析编排
//!
//! 连通性检查 → 编码 → 构造请求 → 调用服务 → 解析响应 → 写入登记表。
//! 单次尝试，不重试、不设本地超时、不支持取消。

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use medscan_analysis::{
    encode_scan, parse_analysis, AnalysisRequest, AnalysisService, DEFAULT_MODEL,
};
use medscan_core::{AnalysisResult, PatientDetails, Result, ScanError, ScanFile};

use crate::connectivity::ConnectivityProbe;
use crate::registry::PatientRegistry;

/// 影像分析编排器
pub struct ScanAnalyzer {
    service: Arc<dyn AnalysisService>,
    connectivity: Arc<dyn ConnectivityProbe>,
    model: String,
}

impl ScanAnalyzer {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            service,
            connectivity,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// 指定模型名称
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 分析一张影像
    ///
    /// 成功时向登记表追加恰好一条记录；任何失败都不会修改登记表。
    pub async fn analyze(
        &self,
        scan: &ScanFile,
        patient: &PatientDetails,
        registry: &mut PatientRegistry,
    ) -> Result<AnalysisResult> {
        if let Err(e) = patient.ensure_complete() {
            warn!(patient_id = %patient.id, "Analysis blocked: {}", e);
            return Err(e);
        }

        if !self.connectivity.is_online().await {
            warn!(patient_id = %patient.id, "Analysis blocked: offline");
            return Err(ScanError::Offline);
        }

        let start = Instant::now();
        let result = self.run(scan, patient).await.map_err(|e| {
            error!(
                patient_id = %patient.id,
                service = self.service.name(),
                "ML Analysis Error: {}", e
            );
            e
        })?;

        registry.record(patient, result.clone());
        info!(
            patient_id = %patient.id,
            diagnosis = %result.diagnosis,
            urgency = %result.urgency,
            elapsed_ms = %start.elapsed().as_millis(),
            "Scan analysis complete"
        );

        Ok(result)
    }

    async fn run(&self, scan: &ScanFile, patient: &PatientDetails) -> Result<AnalysisResult> {
        let image = encode_scan(scan)?;
        let request = AnalysisRequest::new(self.model.clone(), image, Some(patient));
        let text = self.service.generate(&request).await?;
        parse_analysis(text.as_deref())
    }
}
