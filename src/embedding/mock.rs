//! 关键词编码器（测试替身，无需模型）
//!
//! 文本（小写）包含某条规则的关键词时返回该规则的向量，否则返回默认向量；
//! 记录调用次数与编码文本数，便于断言批量编码与一次性初始化。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::Encoder;
use crate::core::EmbeddingError;

/// 确定性的关键词 → 向量编码器
#[derive(Debug, Default)]
pub struct KeywordEncoder {
    rules: Vec<(String, Vec<f32>)>,
    default: Vec<f32>,
    calls: AtomicUsize,
    texts: AtomicUsize,
}

impl KeywordEncoder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// 追加一条规则；按追加顺序匹配，首条命中生效
    pub fn rule(mut self, keyword: impl Into<String>, vector: Vec<f32>) -> Self {
        self.rules.push((keyword.into().to_lowercase(), vector));
        self
    }

    /// encode 被调用的次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 累计编码的文本数
    pub fn texts_encoded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(k, _)| lower.contains(k.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl Encoder for KeywordEncoder {
    fn model_name(&self) -> &str {
        "keyword-stub"
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}
