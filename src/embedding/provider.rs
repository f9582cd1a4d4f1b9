//! 嵌入提供方：包装外部编码器，首次使用时加载一次并在 Router 生命周期内复用
//!
//! 编码器只需返回原始向量；数量、维度检查与 L2 归一化统一在这里完成。

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::EmbeddingVector;
use crate::core::EmbeddingError;

/// 编码器：按输入顺序为每段文本返回一个向量（可未归一化）
#[async_trait]
pub trait Encoder: Send + Sync {
    /// 模型名称（用于日志）
    fn model_name(&self) -> &str;

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// 编码器加载器：在首次编码时调用一次
#[async_trait]
pub trait LoadEncoder: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Encoder>, EmbeddingError>;
}

#[async_trait]
impl<F, Fut> LoadEncoder for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn Encoder>, EmbeddingError>> + Send + 'static,
{
    async fn load(&self) -> Result<Arc<dyn Encoder>, EmbeddingError> {
        (self)().await
    }
}

/// 嵌入提供方：OnceCell 保证并发首次调用只加载一次，之后读取无锁
pub struct EmbeddingProvider {
    loader: Option<Box<dyn LoadEncoder>>,
    encoder: OnceCell<Arc<dyn Encoder>>,
}

impl EmbeddingProvider {
    /// 使用已就绪的编码器
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            loader: None,
            encoder: OnceCell::new_with(Some(encoder)),
        }
    }

    /// 首次编码时通过 loader 加载编码器
    pub fn lazy(loader: impl LoadEncoder + 'static) -> Self {
        Self {
            loader: Some(Box::new(loader)),
            encoder: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.encoder.initialized()
    }

    /// 获取（必要时加载）编码器；加载失败不会缓存，下一次调用会重试加载
    pub async fn encoder(&self) -> Result<&Arc<dyn Encoder>, EmbeddingError> {
        self.encoder
            .get_or_try_init(|| async {
                let loader = self
                    .loader
                    .as_ref()
                    .ok_or_else(|| EmbeddingError::Unavailable("no encoder configured".into()))?;
                let encoder = loader.load().await?;
                tracing::info!(model = %encoder.model_name(), "encoder initialized");
                Ok(encoder)
            })
            .await
    }

    /// 批量编码并归一化；保证返回数量与输入一致、所有向量维度相同
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let encoder = self.encoder().await?;
        let raw = encoder.encode(texts).await?;
        if raw.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: raw.len(),
            });
        }

        let vectors = raw
            .into_iter()
            .map(EmbeddingVector::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        let dim = vectors[0].dim();
        if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }
        Ok(vectors)
    }

    /// 编码单段文本
    pub async fn encode_one(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        let mut vectors = self.encode(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or(EmbeddingError::CountMismatch { expected: 1, actual: 0 })
    }
}
