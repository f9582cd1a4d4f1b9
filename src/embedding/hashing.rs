//! 离线哈希编码器：词袋特征哈希，无需下载模型或调用 API
//!
//! 每个小写词及其前缀（词干近似）哈希到固定维度；没有任何词的文本落在保留的最后一维。
//! 使用固定的 FNV-1a 64 位哈希，同一维度下的向量不随工具链版本变化。

use async_trait::async_trait;

use super::Encoder;
use crate::core::EmbeddingError;

/// 前缀长度：translate / translation 共享 "trans" 特征
const STEM_LEN: usize = 5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// 特征哈希编码器
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimensions: usize,
    name: String,
}

impl HashingEncoder {
    /// dimensions 至少为 2（最后一维保留给空文本）
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(2);
        Self {
            dimensions,
            name: format!("hashing-{dimensions}"),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % (self.dimensions as u64 - 1)) as usize
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();
        let mut any = false;
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            any = true;
            v[self.bucket(word)] += 1.0;
            if word.chars().count() > STEM_LEN {
                let stem: String = word.chars().take(STEM_LEN).collect();
                v[self.bucket(&format!("#{stem}"))] += 0.5;
            }
        }
        if !any {
            v[self.dimensions - 1] = 1.0;
        }
        v
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Encoder for HashingEncoder {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingVector;

    fn cos(enc: &HashingEncoder, a: &str, b: &str) -> f32 {
        let va = EmbeddingVector::normalize(enc.embed(a)).unwrap();
        let vb = EmbeddingVector::normalize(enc.embed(b)).unwrap();
        va.dot(&vb)
    }

    #[test]
    fn test_deterministic() {
        let enc = HashingEncoder::default();
        assert_eq!(enc.embed("Translate this"), enc.embed("Translate this"));
        assert_eq!(enc.embed("Translate this").len(), 256);
    }

    #[test]
    fn test_fnv1a_is_fixed() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a(b"foobar"), 0x8594_4171_f739_67e8);
        let enc = HashingEncoder::new(1024);
        assert_eq!(enc.bucket("a"), (0xaf63_dc4c_8601_ec8c_u64 % 1023) as usize);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let enc = HashingEncoder::default();
        let related = cos(&enc, "translate this sentence", "translation of a sentence");
        let unrelated = cos(&enc, "translate this sentence", "weather tomorrow in paris");
        assert!(related > unrelated);
    }

    #[test]
    fn test_empty_text_not_degenerate() {
        let enc = HashingEncoder::new(8);
        let v = enc.embed("   ");
        assert_eq!(v[7], 1.0);
        assert!(EmbeddingVector::normalize(v).is_ok());
    }
}
