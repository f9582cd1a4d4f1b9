//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；文本与视觉请求可用不同模型。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
    CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::llm::LlmClient;

/// OpenAI 兼容客户端：持有 Client 与模型名，取首条 choice 的 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    vision_model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, vision_model: &str, api_key: &str) -> Self {
        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            vision_model: vision_model.to_string(),
        }
    }

    /// 从 [llm] 段创建；没有 API Key 时返回 None
    pub fn from_config(section: &LlmSection) -> Option<Self> {
        let Some(key) = section.resolved_api_key() else {
            tracing::debug!("llm client skipped: no OPENAI_API_KEY");
            return None;
        };
        Some(Self::new(
            section.base_url.as_deref(),
            &section.model,
            section.vision_model(),
            &key,
        ))
    }

    async fn send(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| e.to_string())?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| e.to_string())?
                .into(),
        ];
        self.send(&self.model, messages).await
    }

    async fn describe_image(&self, prompt: &str, image_url: &str) -> Result<String, String> {
        let text = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(prompt)
            .build()
            .map_err(|e| e.to_string())?;
        let image = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(image_url)
                    .detail(ImageDetail::Auto)
                    .build()
                    .map_err(|e| e.to_string())?,
            )
            .build()
            .map_err(|e| e.to_string())?;
        let parts: Vec<ChatCompletionRequestUserMessageContentPart> =
            vec![text.into(), image.into()];
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(parts)
            .build()
            .map_err(|e| e.to_string())?
            .into()];
        self.send(&self.vision_model, messages).await
    }
}
