//! 远程分析服务客户端
//!
//! 提供统一的 `AnalysisService` 接口，支持：
//! - Gemini `generateContent` 接口（reqwest）
//! - 测试与演示用的模拟服务

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use medscan_core::error::MISSING_API_KEY_MESSAGE;
use medscan_core::{Result, ScanError};

use crate::request::{AnalysisRequest, GenerateContentResponse, DEFAULT_MODEL};

/// 默认接口地址
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// 远程分析服务接口
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// 服务名称
    fn name(&self) -> &str;

    /// 发送请求，返回模型输出的原始文本；服务没有返回文本时为 `None`
    async fn generate(&self, request: &AnalysisRequest) -> Result<Option<String>>;
}

/// Gemini连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// 接口地址
    pub endpoint: String,
    /// 模型名称
    pub model: String,
    /// API密钥
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl GeminiConfig {
    /// 返回非空的API密钥，缺失时为配置错误
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ScanError::Config(MISSING_API_KEY_MESSAGE.to_string()))
    }
}

/// Gemini分析服务
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// 创建客户端；缺少API密钥时在发出任何请求之前失败
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &AnalysisRequest) -> Result<Option<String>> {
        let url = self.url(&request.model);
        info!(
            model = %request.model,
            mime = %request.image.mime_type,
            payload_len = request.image.data.len(),
            "Sending scan to analysis service"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request.to_wire())
            .send()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Analysis service returned an error");
            return Err(ScanError::Transport(format!(
                "analysis service returned {}",
                status
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Transport(format!("invalid response envelope: {}", e)))?;

        let text = body.text();
        debug!(has_text = text.is_some(), "Analysis service responded");
        Ok(text)
    }
}

/// 模拟分析服务，返回预设文本或错误，并记录调用次数
pub struct MockAnalysisService {
    response: MockResponse,
    calls: AtomicUsize,
}

enum MockResponse {
    Text(Option<String>),
    Failure(String),
}

impl MockAnalysisService {
    /// 返回固定文本
    pub fn with_text(text: &str) -> Self {
        Self {
            response: MockResponse::Text(Some(text.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// 服务应答但没有文本
    pub fn without_text() -> Self {
        Self {
            response: MockResponse::Text(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// 传输失败
    pub fn failing(message: &str) -> Self {
        Self {
            response: MockResponse::Failure(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _request: &AnalysisRequest) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            MockResponse::Text(text) => Ok(text.clone()),
            MockResponse::Failure(msg) => Err(ScanError::Transport(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodedImage;
    use std::sync::Arc;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            DEFAULT_MODEL,
            EncodedImage {
                mime_type: "image/png".to_string(),
                data: "AAAA".to_string(),
            },
            None,
        )
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = GeminiClient::new(GeminiConfig::default()).err().unwrap();
        assert!(matches!(err, ScanError::Config(ref msg) if msg == MISSING_API_KEY_MESSAGE));

        let blank = GeminiConfig {
            api_key: Some("   ".to_string()),
            ..GeminiConfig::default()
        };
        assert!(GeminiClient::new(blank).is_err());
    }

    #[test]
    fn test_url_building() {
        let client = GeminiClient::new(GeminiConfig {
            endpoint: "http://localhost:9000/v1beta/".to_string(),
            api_key: Some("test-key".to_string()),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.url("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_mock_service_counts_calls() {
        let service = MockAnalysisService::with_text("{}");
        assert_eq!(service.generate(&request()).await.unwrap().as_deref(), Some("{}"));
        assert_eq!(service.call_count(), 1);

        let failing = MockAnalysisService::failing("connection refused");
        assert!(matches!(
            failing.generate(&request()).await,
            Err(ScanError::Transport(_))
        ));
        assert_eq!(failing.call_count(), 1);
    }

    /// 本地桩服务：记录请求路径和密钥头，返回预设状态和响应体
    #[derive(Clone, Default)]
    struct StubState {
        seen: Arc<std::sync::Mutex<Vec<(String, Option<String>)>>>,
    }

    async fn spawn_stub(status: u16, body: &'static str) -> (GeminiClient, StubState) {
        use axum::{
            extract::State,
            http::{HeaderMap, StatusCode, Uri},
            Router,
        };

        let stub = StubState::default();
        let app = Router::new()
            .fallback(
                move |State(stub): State<StubState>, uri: Uri, headers: HeaderMap| async move {
                    let key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    stub.seen.lock().unwrap().push((uri.path().to_string(), key));
                    (StatusCode::from_u16(status).unwrap(), body)
                },
            )
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = GeminiClient::new(GeminiConfig {
            endpoint: format!("http://{}/v1beta", addr),
            api_key: Some("stub-key".to_string()),
            ..GeminiConfig::default()
        })
        .unwrap();
        (client, stub)
    }

    #[tokio::test]
    async fn test_generate_sends_key_and_concatenates_text() {
        let (client, stub) = spawn_stub(
            200,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"diagnosis\":"},{"text":"\"Normal\"}"}]}}]}"#,
        )
        .await;

        let text = client.generate(&request()).await.unwrap();
        assert_eq!(text.as_deref(), Some(r#"{"diagnosis":"Normal"}"#));

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/v1beta/models/gemini-2.5-flash:generateContent");
        assert_eq!(seen[0].1.as_deref(), Some("stub-key"));
    }

    #[tokio::test]
    async fn test_generate_without_candidates_is_none() {
        let (client, _) = spawn_stub(200, r#"{"candidates":[]}"#).await;
        assert!(client.generate(&request()).await.unwrap().is_none());

        let (client, _) = spawn_stub(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;
        assert!(client.generate(&request()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let (client, stub) =
            spawn_stub(403, r#"{"error":{"code":403,"message":"API key not valid"}}"#).await;
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ScanError::Transport(ref msg) if msg.contains("403")));
        assert_eq!(err.user_message(), medscan_core::error::GENERIC_FAILURE_MESSAGE);
        assert_eq!(stub.seen.lock().unwrap().len(), 1);

        let (client, _) = spawn_stub(500, "internal").await;
        assert!(matches!(
            client.generate(&request()).await,
            Err(ScanError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = GeminiClient::new(GeminiConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            api_key: Some("test-key".to_string()),
            ..GeminiConfig::default()
        })
        .unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ScanError::Transport(_)));
    }
}
