//! Maestro - 语义任务路由
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **embedding**: 单位向量、编码器抽象与实现（OpenAI 兼容 / 哈希 / 关键词替身）
//! - **llm**: Chat 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **observability**: 日志初始化
//! - **router**: 任务嵌入索引、阈值决策、分派与回退
//! - **tasks**: 任务描述、注册表与内置任务

pub mod config;
pub mod core;
pub mod embedding;
pub mod llm;
pub mod observability;
pub mod router;
pub mod tasks;

pub use crate::core::{EmbeddingError, RouterError, TaskError};
pub use router::{Fallback, Router, RouterConfig, RoutingDecision};
pub use tasks::{Task, TaskRegistry};
