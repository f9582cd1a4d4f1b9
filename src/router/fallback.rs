//! 回退：没有任务超过阈值时由调用方提供的处理函数
//!
//! 未提供回退时 Router 返回 NoMatchSentinel 定义的固定结果，而不是报错。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::TaskError;
use crate::llm::LlmClient;

/// 回退处理函数
#[async_trait]
pub trait Fallback<R>: Send + Sync {
    async fn call(&self, query: &str) -> Result<R, TaskError>;
}

/// 把同步闭包包装为回退
pub struct FnFallback<F>(F);

impl<F> FnFallback<F> {
    pub fn new<R>(f: F) -> Self
    where
        F: Fn(&str) -> Result<R, TaskError>,
    {
        Self(f)
    }
}

#[async_trait]
impl<R, F> Fallback<R> for FnFallback<F>
where
    R: Send + 'static,
    F: Fn(&str) -> Result<R, TaskError> + Send + Sync,
{
    async fn call(&self, query: &str) -> Result<R, TaskError> {
        (self.0)(query)
    }
}

/// 固定回复
#[derive(Debug, Clone)]
pub struct StaticFallback(String);

impl StaticFallback {
    pub fn new(reply: impl Into<String>) -> Self {
        Self(reply.into())
    }
}

impl Default for StaticFallback {
    fn default() -> Self {
        Self::new("I'm sorry, I don't have the information to answer that question right now.")
    }
}

#[async_trait]
impl Fallback<String> for StaticFallback {
    async fn call(&self, _query: &str) -> Result<String, TaskError> {
        Ok(self.0.clone())
    }
}

/// 通用对话回退：把请求直接交给 Chat 模型
pub struct ChatFallback {
    llm: Arc<dyn LlmClient>,
}

impl ChatFallback {
    const SYSTEM: &'static str =
        "You are Maestro, a concise and helpful assistant. Answer the user's message directly.";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Fallback<String> for ChatFallback {
    async fn call(&self, query: &str) -> Result<String, TaskError> {
        self.llm
            .complete(Self::SYSTEM, query)
            .await
            .map(|s| s.trim().to_string())
            .map_err(TaskError::Llm)
    }
}

/// 未匹配且没有回退时返回的固定结果
pub trait NoMatchSentinel {
    fn no_suitable_task() -> Self;
}

impl NoMatchSentinel for String {
    fn no_suitable_task() -> Self {
        "[No suitable task found]".to_string()
    }
}

impl<T> NoMatchSentinel for Option<T> {
    fn no_suitable_task() -> Self {
        None
    }
}

impl NoMatchSentinel for serde_json::Value {
    fn no_suitable_task() -> Self {
        serde_json::json!({ "error": "no suitable task found" })
    }
}
