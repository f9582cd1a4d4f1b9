//! 嵌入层：单位向量、编码器抽象、一次性加载的提供方与具体编码器（OpenAI 兼容 / 哈希 / 关键词替身）

pub mod hashing;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod vector;

pub use hashing::HashingEncoder;
pub use mock::KeywordEncoder;
pub use openai::{create_encoder_from_config, OpenAiEncoder};
pub use provider::{EmbeddingProvider, Encoder, LoadEncoder};
pub use vector::EmbeddingVector;
