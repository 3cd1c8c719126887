//! MedScan影像分析演示程序
//!
//! 使用模拟分析服务展示：
//! - 影像编码与请求构造
//! - 响应解析与严重程度分级
//! - 离线状态下的拦截

use std::sync::Arc;

use anyhow::Result;
use medscan_analysis::{
    encode_scan, parse_analysis, AnalysisRequest, MockAnalysisService, DEFAULT_MODEL,
};
use medscan_core::{PatientDetails, ScanFile};
use medscan_workflow::{PatientRegistry, ScanAnalyzer, StaticConnectivity};
use tracing::{info, warn};

const SAMPLE_RESPONSE: &str = r#"{
  "diagnosis": "Malignant",
  "confidence": 87,
  "severityScore": 7,
  "urgency": "Urgent",
  "reliabilityScore": 8,
  "stage": "Stage II",
  "summary": "Spiculated nodule in the right upper lobe.",
  "findings": ["2.1 cm spiculated nodule, right upper lobe"],
  "recommendations": ["Contrast CT of the chest", "Pulmonology referral"],
  "affectedAreaCoordinates": {"x": 38, "y": 30, "r": 12}
}"#;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    info!("🚀 启动MedScan影像分析演示");

    let scan = ScanFile::new("chest.png", "image/png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A])?;
    let mut patient = PatientDetails::blank();
    patient.name = "Demo Patient".to_string();
    patient.age = "64".to_string();
    patient.symptoms = "persistent cough".to_string();
    patient.history = "30 pack-years".to_string();

    demo_request(&scan, &patient)?;
    demo_parse()?;
    demo_analyzer(&scan, &patient).await?;

    info!("✅ 影像分析演示完成");
    Ok(())
}

/// 编码与请求构造演示
fn demo_request(scan: &ScanFile, patient: &PatientDetails) -> Result<()> {
    info!("\n📋 请求构造演示");

    let image = encode_scan(scan)?;
    info!("   MIME类型: {}", image.mime_type);
    info!("   Base64长度: {}", image.data.len());

    let request = AnalysisRequest::new(DEFAULT_MODEL, image, Some(patient));
    let wire = serde_json::to_string_pretty(&request.to_wire())?;
    info!("   请求体长度: {} 字符", wire.len());

    Ok(())
}

/// 响应解析演示
fn demo_parse() -> Result<()> {
    info!("\n🔍 响应解析演示");

    let result = parse_analysis(Some(SAMPLE_RESPONSE))?;
    info!("   诊断: {}", result.diagnosis);
    info!("   置信度: {}%", result.confidence);
    info!("   严重程度: {:?}", result.severity_band());
    info!("   紧急程度: {}", result.urgency);

    match parse_analysis(Some("{\"diagnosis\": \"Unknown\"}")) {
        Ok(_) => warn!("❌ 非法响应未被拒绝"),
        Err(e) => info!("   非法响应被拒绝: {}", e),
    }

    Ok(())
}

/// 分析编排演示
async fn demo_analyzer(scan: &ScanFile, patient: &PatientDetails) -> Result<()> {
    info!("\n🩺 分析编排演示");

    let connectivity = Arc::new(StaticConnectivity::online());
    let analyzer = ScanAnalyzer::new(
        Arc::new(MockAnalysisService::with_text(SAMPLE_RESPONSE)),
        connectivity.clone(),
    );
    let mut registry = PatientRegistry::new();

    let result = analyzer.analyze(scan, patient, &mut registry).await?;
    info!("✅ 分析完成: {} (登记表 {} 条)", result.diagnosis, registry.len());

    connectivity.set_online(false);
    match analyzer.analyze(scan, patient, &mut registry).await {
        Ok(_) => warn!("❌ 离线状态下分析未被拦截"),
        Err(e) => info!("   离线拦截: {}", e.user_message()),
    }
    info!("   登记表仍为 {} 条", registry.len());

    Ok(())
}
