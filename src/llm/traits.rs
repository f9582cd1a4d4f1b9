//! LLM 客户端抽象
//!
//! 翻译、图像描述 / OCR 任务与对话回退只依赖 LlmClient：complete（系统提示 + 用户文本）、
//! describe_image（提示 + 图片 URL）。

use async_trait::async_trait;

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, system: &str, user: &str) -> Result<String, String>;

    /// 视觉模型：按提示处理图片
    async fn describe_image(&self, prompt: &str, image_url: &str) -> Result<String, String>;
}
