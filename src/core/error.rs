//! 路由错误类型
//!
//! RouterError 是 Router 对调用方暴露的唯一错误；TaskError 描述任务解析器 / 回退函数失败的原因，
//! EmbeddingError 描述编码器失败或违反向量契约（数量、维度、退化向量）。

use std::time::Duration;

use thiserror::Error;

/// Router 构建与处理请求时可能出现的错误
#[derive(Error, Debug)]
pub enum RouterError {
    /// 编码器无法加载或无法访问；构建阶段致命
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// 注册表为空；构建阶段致命
    #[error("Task registry is empty")]
    EmptyRegistry,

    /// 路由配置无效（缺少阈值、阈值为 NaN / inf）；构建阶段致命
    #[error("Invalid router config: {0}")]
    InvalidConfig(String),

    /// 编码器已加载，但本次编码失败或返回的向量不满足契约
    #[error("Embedding error: {0}")]
    Embedding(#[source] EmbeddingError),

    /// 命中了任务，但任务解析器失败（不会转为回退）
    #[error("Task '{task_name}' failed: {cause}")]
    TaskResolutionFailed {
        task_name: String,
        #[source]
        cause: TaskError,
    },

    /// 回退函数本身失败
    #[error("Fallback failed: {cause}")]
    FallbackFailed {
        #[source]
        cause: TaskError,
    },
}

impl RouterError {
    /// 是否属于构建阶段的配置错误（编码器不可用 / 空注册表 / 配置无效）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EncoderUnavailable(_) | Self::EmptyRegistry | Self::InvalidConfig(_)
        )
    }
}

/// 任务解析器或回退函数失败的原因
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,
}

/// 编码器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// 模型无法加载 / 端点不可达
    #[error("Encoder unavailable: {0}")]
    Unavailable(String),

    /// 编码请求失败
    #[error("Encoding request failed: {0}")]
    Request(String),

    #[error("Encoder returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 零范数或含 NaN / inf 的向量无法归一化
    #[error("Degenerate embedding: {0}")]
    Degenerate(String),
}

/// Unavailable 统一上抛为 EncoderUnavailable，其余保留为 Embedding
impl From<EmbeddingError> for RouterError {
    fn from(e: EmbeddingError) -> Self {
        match e {
            EmbeddingError::Unavailable(msg) => RouterError::EncoderUnavailable(msg),
            other => RouterError::Embedding(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_maps_to_encoder_unavailable() {
        let err: RouterError = EmbeddingError::Unavailable("no key".into()).into();
        assert!(matches!(err, RouterError::EncoderUnavailable(ref m) if m == "no key"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_contract_violation_stays_embedding() {
        let err: RouterError = EmbeddingError::CountMismatch { expected: 2, actual: 1 }.into();
        assert!(matches!(err, RouterError::Embedding(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_task_resolution_failed_message() {
        let err = RouterError::TaskResolutionFailed {
            task_name: "translate".into(),
            cause: TaskError::Failed("model down".into()),
        };
        assert_eq!(err.to_string(), "Task 'translate' failed: model down");
    }
}
