//! MedScan服务器主程序

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use medscan_analysis::GeminiClient;
use medscan_web::{SessionStore, WebServer, WebState};
use medscan_workflow::{
    AcceptAllVerifier, ConnectivityProbe, ScanAnalyzer, StaticConnectivity, TcpConnectivity,
};
use tracing::{error, info, warn};

use crate::config::AppConfig;

/// MedScan服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "medscan-server")]
#[command(about = "肺部影像AI辅助分析服务器")]
struct Args {
    /// 监听端口（覆盖配置文件）
    #[arg(short, long)]
    port: Option<u16>,

    /// 监听地址（覆盖配置文件）
    #[arg(long)]
    host: Option<String>,

    /// 配置文件路径
    #[arg(short, long, default_value = "medscan.toml")]
    config: String,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 以离线模式启动，所有分析请求被拒绝
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .init();

    info!("启动MedScan服务器...");

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if args.offline {
        config.connectivity.enabled = false;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    info!("MedScan服务器配置:");
    info!("  监听地址: {}", addr);
    info!("  模型: {}", config.gemini.model);
    info!("  接口地址: {}", config.gemini.endpoint);
    info!("  网络探测: {}", config.connectivity.probe_address);
    info!(
        "  会话: 空闲超时 {}s，上限 {}",
        config.sessions.idle_timeout_secs, config.sessions.max_sessions
    );

    // 缺少API密钥时直接退出
    let model = config.gemini.model.clone();
    let client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("分析服务初始化失败: {}", e);
            return Err(e.into());
        }
    };

    let connectivity: Arc<dyn ConnectivityProbe> = if config.connectivity.enabled {
        Arc::new(TcpConnectivity::new(
            config.connectivity.probe_address.clone(),
            config.connectivity.timeout(),
        ))
    } else {
        warn!("离线模式：分析请求将被拒绝");
        Arc::new(StaticConnectivity::offline())
    };

    let analyzer = ScanAnalyzer::new(Arc::new(client), connectivity).with_model(model);
    let sessions = SessionStore::with_limits(
        config.sessions.idle_timeout(),
        config.sessions.max_sessions,
    );
    let state = WebState::new(Arc::new(AcceptAllVerifier), analyzer).with_sessions(sessions);

    // 启动服务器
    if let Err(e) = WebServer::new(addr, state).run().await {
        error!("服务器启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}
