//! OpenAI 兼容的 /embeddings 端点（async-openai），一次请求批量编码多段文本

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;

use super::{EmbeddingProvider, Encoder, HashingEncoder};
use crate::config::EmbeddingSection;
use crate::core::EmbeddingError;

/// 使用 async-openai 调用 OpenAI 兼容的 embeddings API
#[derive(Clone)]
pub struct OpenAiEncoder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEncoder {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str) -> Self {
        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    /// 创建并探测端点：无 API Key 或探测请求失败时返回 Unavailable
    pub async fn connect(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
    ) -> Result<Self, EmbeddingError> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EmbeddingError::Unavailable("no OPENAI_API_KEY".into()))?;

        let encoder = Self::new(base_url, model, &key);
        encoder
            .encode(&["ping".to_string()])
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("{model}: {e}")))?;
        Ok(encoder)
    }
}

#[async_trait]
impl Encoder for OpenAiEncoder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // 端点拒绝空字符串
        let input: Vec<String> = texts
            .iter()
            .map(|t| if t.trim().is_empty() { " ".to_string() } else { t.clone() })
            .collect();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

/// 从配置创建嵌入提供方：openai 在首次使用时连接，hashing 立即就绪
pub fn create_encoder_from_config(
    section: &EmbeddingSection,
) -> Result<EmbeddingProvider, EmbeddingError> {
    match section.provider.as_str() {
        "openai" => {
            let section = section.clone();
            Ok(EmbeddingProvider::lazy(move || {
                let section = section.clone();
                async move {
                    let encoder = OpenAiEncoder::connect(
                        section.base_url.as_deref(),
                        &section.model,
                        section.api_key.as_deref(),
                    )
                    .await?;
                    Ok::<_, EmbeddingError>(Arc::new(encoder) as Arc<dyn Encoder>)
                }
            }))
        }
        "hashing" => Ok(EmbeddingProvider::new(Arc::new(HashingEncoder::new(
            section.dimensions,
        )))),
        other => Err(EmbeddingError::Unavailable(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let section = EmbeddingSection {
            provider: "word2vec".into(),
            ..EmbeddingSection::default()
        };
        assert!(matches!(
            create_encoder_from_config(&section),
            Err(EmbeddingError::Unavailable(_))
        ));
    }

    #[test]
    fn test_hashing_provider_ready() {
        let section = EmbeddingSection {
            provider: "hashing".into(),
            ..EmbeddingSection::default()
        };
        let provider = create_encoder_from_config(&section).unwrap();
        assert!(provider.is_loaded());
    }

    #[tokio::test]
    async fn test_openai_without_key_unavailable() {
        let section = EmbeddingSection {
            provider: "openai".into(),
            api_key: Some(String::new()),
            ..EmbeddingSection::default()
        };
        // 空 key 被过滤后回落到环境变量；环境里没有 key 时应报 Unavailable
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        let provider = create_encoder_from_config(&section).unwrap();
        let err = provider.encode_one("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
    }
}
