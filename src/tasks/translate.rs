//! 翻译任务：法语 ↔ 英语互译
//!
//! 先用字符 / 常见词标记粗判源语言，目标语言取另一种；实际翻译交给 Chat 模型。

use std::sync::Arc;

use async_trait::async_trait;

use super::Resolver;
use crate::core::TaskError;
use crate::llm::LlmClient;

pub const NAME: &str = "Traduction";

pub const DESCRIPTION: &str = "Traduction bilingue haute fidélité (Français <-> Anglais). \
    Préserve le sens, le ton, la terminologie spécifique au domaine et les expressions idiomatiques. \
    Gère les entités et fragments de code en toute sécurité. \
    Entrée : texte brut en FR ou EN ; Sortie : texte traduit. \
    Bilingual French <-> English translation: translate text to English or to French.";

const FR_CHARS: [char; 4] = ['é', 'è', 'ç', 'à'];
const FR_WORDS: [&str; 7] = ["ou", "est", "avec", "pour", "dans", "le", "la"];
const EN_WORDS: [&str; 7] = ["the", "and", "with", "from", "you", "is", "are"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    French,
    English,
}

impl Language {
    pub fn other(self) -> Self {
        match self {
            Language::French => Language::English,
            Language::English => Language::French,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Language::French => "French",
            Language::English => "English",
        }
    }
}

/// 粗判语言：带法语重音字符或法语常见词 → 法语；英语常见词 → 英语；都没有时默认法语
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    if lower.chars().any(|c| FR_CHARS.contains(&c)) {
        return Language::French;
    }
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| FR_WORDS.contains(w)) {
        return Language::French;
    }
    if words.iter().any(|w| EN_WORDS.contains(w)) {
        return Language::English;
    }
    Language::French
}

/// 翻译解析器
pub struct TranslateResolver {
    llm: Arc<dyn LlmClient>,
}

impl TranslateResolver {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn system_prompt(source: Language, target: Language) -> String {
        format!(
            "Translate the user's text from {} to {}.\n\
             Preserve meaning, tone, domain terminology and idioms. \
             Keep named entities and code fragments unchanged. \
             Reply with the translation only.",
            source.label(),
            target.label()
        )
    }
}

#[async_trait]
impl Resolver<String> for TranslateResolver {
    async fn resolve(&self, query: &str) -> Result<String, TaskError> {
        let text = query.trim();
        if text.is_empty() {
            return Err(TaskError::InvalidInput("nothing to translate".into()));
        }
        let source = detect_language(text);
        let target = source.other();
        tracing::debug!(source = ?source, target = ?target, "translate");
        let out = self
            .llm
            .complete(&Self::system_prompt(source, target), text)
            .await
            .map_err(TaskError::Llm)?;
        Ok(out.trim().to_string())
    }
}
