//! 单位向量：只能通过归一化构造，点积即余弦相似度

use crate::core::EmbeddingError;

/// L2 归一化后的嵌入向量
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// 归一化原始向量；空向量、零范数、含 NaN / inf 时返回 Degenerate
    pub fn normalize(raw: Vec<f32>) -> Result<Self, EmbeddingError> {
        if raw.is_empty() {
            return Err(EmbeddingError::Degenerate("empty vector".into()));
        }
        if raw.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::Degenerate("non-finite component".into()));
        }
        let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(EmbeddingError::Degenerate("zero norm".into()));
        }
        Ok(Self(raw.into_iter().map(|x| x / norm).collect()))
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// 点积（两者均为单位向量，结果即余弦相似度）；调用方保证维度一致
    pub fn dot(&self, other: &Self) -> f32 {
        debug_assert_eq!(self.dim(), other.dim());
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }
}
