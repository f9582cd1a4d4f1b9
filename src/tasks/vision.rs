//! 图像任务：图片描述（captioning）与文字识别（OCR），均通过视觉模型处理请求中的图片链接

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use super::Resolver;
use crate::core::TaskError;
use crate::llm::LlmClient;

pub const CAPTION_NAME: &str = "Génération de légendes d'images";

pub const CAPTION_DESCRIPTION: &str = "Générer des légendes descriptives et adaptées au contexte pour des images. \
    Utile pour l'accessibilité, la modération de contenu et la génération de métadonnées. \
    Entrée : image unique ; Sortie : une courte légende descriptive. \
    Exemple : Légende-moi cette image ! Describe or caption this picture.";

pub const OCR_NAME: &str = "OCR";

pub const OCR_DESCRIPTION: &str = "Reconnaissance optique de caractères pour images et documents scannés. \
    Renvoie le texte extrait. Entrée : images ou URL d'images ; \
    Sortie : texte brut extrait et champs structurés pour tableaux/formulaires. \
    Cas particuliers : images de faible qualité, écriture manuscrite, langues mixtes. \
    Extract or read the text written in an image.";

static IMAGE_URL_RE: OnceLock<Regex> = OnceLock::new();

/// 提取请求中的第一个图片链接（http/https，常见图片扩展名，可带查询串或锚点）
///
/// 扩展名之后必须是空白、引号、结束括号 / 标点或文本结尾，`a.png-viewer/` 这类路径不算图片。
pub fn extract_image_url(query: &str) -> Option<&str> {
    let re = IMAGE_URL_RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(https?://[^\s"'<>]+?\.(?:png|jpe?g|gif|webp|bmp)(?:[?#][^\s"'<>]*)?)(?:[\s"'<>),;!]|\.(?:\s|$)|$)"#,
        )
        .unwrap()
    });
    re.captures(query).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionMode {
    Caption,
    Ocr,
}

impl VisionMode {
    fn prompt(self) -> &'static str {
        match self {
            VisionMode::Caption => {
                "Write one short, descriptive caption for this image. Reply with the caption only."
            }
            VisionMode::Ocr => {
                "Extract all text visible in this image, preserving line breaks and table layout. \
                 Reply with the extracted text only."
            }
        }
    }
}

/// 视觉解析器
pub struct VisionResolver {
    llm: Arc<dyn LlmClient>,
    mode: VisionMode,
}

impl VisionResolver {
    pub fn new(llm: Arc<dyn LlmClient>, mode: VisionMode) -> Self {
        Self { llm, mode }
    }
}

#[async_trait]
impl Resolver<String> for VisionResolver {
    async fn resolve(&self, query: &str) -> Result<String, TaskError> {
        let url = extract_image_url(query)
            .ok_or_else(|| TaskError::InvalidInput("no image URL in request".into()))?;
        let out = self
            .llm
            .describe_image(self.mode.prompt(), url)
            .await
            .map_err(TaskError::Llm)?;
        Ok(out.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_extract_image_url() {
        assert_eq!(
            extract_image_url("caption this https://x.org/a/cat.JPG please"),
            Some("https://x.org/a/cat.JPG")
        );
        assert_eq!(
            extract_image_url("read http://h/scan.png?size=2 now"),
            Some("http://h/scan.png?size=2")
        );
        assert_eq!(extract_image_url("see https://x.org/page.html"), None);
        assert_eq!(extract_image_url("open https://ex.com/images.png-viewer/page"), None);
        assert_eq!(
            extract_image_url("is this ok? https://h/a.webp#frag"),
            Some("https://h/a.webp#frag")
        );
        assert_eq!(
            extract_image_url("look at \"https://h/b.gif\", then https://h/c.png."),
            Some("https://h/b.gif")
        );
        assert_eq!(extract_image_url("(https://h/d.jpeg)"), Some("https://h/d.jpeg"));
        assert_eq!(extract_image_url("no link"), None);
    }

    #[tokio::test]
    async fn test_ocr_resolver_uses_ocr_prompt() {
        let llm = Arc::new(MockLlmClient::default());
        let resolver = VisionResolver::new(llm.clone(), VisionMode::Ocr);
        let out = resolver.resolve("text in https://h/doc.png").await.unwrap();
        assert!(out.starts_with("[Extract all text"));
        assert!(out.ends_with("https://h/doc.png"));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_image_is_invalid_input() {
        let resolver = VisionResolver::new(Arc::new(MockLlmClient::default()), VisionMode::Caption);
        assert!(matches!(
            resolver.resolve("caption my picture").await,
            Err(TaskError::InvalidInput(_))
        ));
    }
}
