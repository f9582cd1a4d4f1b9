//! Mock LLM 客户端（用于测试，无需 API）
//!
//! complete 回显系统提示首行与用户文本；describe_image 回显提示与图片 URL。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::llm::LlmClient;

/// Mock 客户端：回显输入并计数
#[derive(Debug, Default)]
pub struct MockLlmClient {
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let head = system.lines().next().unwrap_or("");
        Ok(format!("[{head}] {user}"))
    }

    async fn describe_image(&self, prompt: &str, image_url: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{prompt}] {image_url}"))
    }
}
