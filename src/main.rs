//! Maestro - 语义任务路由
//!
//! 入口：初始化日志、加载配置、构建 Router（内置任务 + 配置的编码器），逐行读取 stdin 请求并输出结果。
//! 用法：maestro [config.toml]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use maestro::config::load_config;
use maestro::embedding::create_encoder_from_config;
use maestro::llm::OpenAiClient;
use maestro::router::{ChatFallback, Fallback, StaticFallback};
use maestro::tasks::builtin_tasks;
use maestro::{observability, Router, RouterConfig, RouterError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const APOLOGY: &str = "Sorry, something went wrong while handling your request.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config = load_config(std::env::args().nth(1).map(PathBuf::from))
        .context("Failed to load config")?;
    let router_config = RouterConfig::from_section(&config.router)
        .context("Invalid [router] config (set threshold in config/default.toml or MAESTRO__ROUTER__THRESHOLD)")?;

    let provider = create_encoder_from_config(&config.embedding)
        .map_err(RouterError::from)
        .context("Failed to create encoder")?;
    let router = Router::builder(router_config)
        .provider(provider)
        .tasks(builtin_tasks(&config))
        .build()
        .await
        .context("Failed to build router")?;

    // 配置了 Chat 模型时用对话回退，否则固定致歉
    let fallback: Box<dyn Fallback<String>> = match OpenAiClient::from_config(&config.llm) {
        Some(client) => Box::new(ChatFallback::new(Arc::new(client))),
        None => Box::new(StaticFallback::default()),
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let reply = match router.handle_request(query, Some(fallback.as_ref())).await {
            Ok(reply) => reply,
            Err(e) if e.is_configuration() => {
                return Err(e).context("Router became unusable");
            }
            Err(e) => {
                tracing::error!(error = %e, "request failed");
                APOLOGY.to_string()
            }
        };
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
