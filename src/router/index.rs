//! 任务嵌入索引：一次批量编码全部任务描述，第 i 行对应注册表第 i 个任务

use crate::core::{EmbeddingError, RouterError};
use crate::embedding::{EmbeddingProvider, EmbeddingVector};
use crate::tasks::TaskRegistry;

/// 每个任务描述的单位向量，顺序与注册表一致
#[derive(Debug, Clone)]
pub struct TaskIndex {
    vectors: Vec<EmbeddingVector>,
}

impl TaskIndex {
    /// 批量编码注册表中所有描述（仅一次编码调用）
    pub async fn build<R>(
        registry: &TaskRegistry<R>,
        provider: &EmbeddingProvider,
    ) -> Result<Self, RouterError> {
        if registry.is_empty() {
            return Err(RouterError::EmptyRegistry);
        }
        let vectors = provider.encode(&registry.descriptions()).await?;
        let index = Self { vectors };
        tracing::info!(tasks = index.len(), dim = index.dim(), "task embeddings computed");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.first().map(|v| v.dim()).unwrap_or(0)
    }

    pub fn get(&self, i: usize) -> Option<&EmbeddingVector> {
        self.vectors.get(i)
    }

    /// 查询向量与每一行的余弦相似度；维度不一致时报错而不是静默截断
    pub fn scores(&self, query: &EmbeddingVector) -> Result<Vec<f32>, EmbeddingError> {
        if query.dim() != self.dim() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dim(),
                actual: query.dim(),
            });
        }
        Ok(self.vectors.iter().map(|v| query.dot(v)).collect())
    }
}
