//! 网络连通性检测
//!
//! 只作为发起请求前的提示性检查，远程调用本身不依赖它

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

/// 连通性检测接口
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// 固定状态，可在运行时切换
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// 通过TCP连接探测目标主机
#[derive(Debug, Clone)]
pub struct TcpConnectivity {
    address: String,
    timeout: Duration,
}

impl TcpConnectivity {
    /// `address` 形如 `host:port`
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivity {
    async fn is_online(&self) -> bool {
        let online = matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await,
            Ok(Ok(_))
        );
        debug!(address = %self.address, online, "Connectivity probe");
        online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_connectivity_toggle() {
        let probe = StaticConnectivity::online();
        assert!(probe.is_online().await);
        probe.set_online(false);
        assert!(!probe.is_online().await);
        assert!(!StaticConnectivity::offline().is_online().await);
    }

    #[tokio::test]
    async fn test_tcp_probe_against_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpConnectivity::new(addr.to_string(), Duration::from_secs(1));
        assert!(probe.is_online().await);

        drop(listener);
        let closed = TcpConnectivity::new(addr.to_string(), Duration::from_millis(200));
        assert!(!closed.is_online().await);
    }
}
