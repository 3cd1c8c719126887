//! 凭据校验
//!
//! 演示版本接受任意非空用户名和密码，生产环境可替换为真实的 `CredentialVerifier` 实现

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use medscan_core::utils::capitalize_first;
use medscan_core::{Result, ScanError, User, UserRole};

/// 登录失败提示
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please contact IT support.";

/// 登录凭据
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// 凭据校验接口
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// 校验凭据，成功时返回登录用户
    async fn verify(&self, credentials: &Credentials) -> Result<User>;
}

/// 接受任意非空凭据的校验器，仅用于演示和测试
#[derive(Debug, Clone, Default)]
pub struct AcceptAllVerifier;

#[async_trait]
impl CredentialVerifier for AcceptAllVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<User> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            warn!("Login rejected: empty username or password");
            return Err(ScanError::Authentication(
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ));
        }

        let user = User {
            id: "1".to_string(),
            name: capitalize_first(&credentials.username),
            role: UserRole::Doctor,
            email: format!("{}@hospital.org", credentials.username.to_lowercase()),
        };

        info!("User logged in: {}", user.name);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_any_non_empty_credentials() {
        let user = AcceptAllVerifier
            .verify(&Credentials::new("jDoe", "anything"))
            .await
            .unwrap();
        assert_eq!(user.name, "JDoe");
        assert_eq!(user.email, "jdoe@hospital.org");
        assert_eq!(user.role, UserRole::Doctor);
        assert_eq!(user.id, "1");
    }

    #[tokio::test]
    async fn test_rejects_empty_fields() {
        for (u, p) in [("", "secret"), ("doctor", ""), ("", "")] {
            let err = AcceptAllVerifier
                .verify(&Credentials::new(u, p))
                .await
                .unwrap_err();
            assert_eq!(err.user_message(), INVALID_CREDENTIALS_MESSAGE);
        }
    }
}
