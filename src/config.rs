//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MAESTRO__*` 覆盖（双下划线表示嵌套，如 `MAESTRO__ROUTER__THRESHOLD=0.4`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterSection,
    pub embedding: EmbeddingSection,
    pub llm: LlmSection,
    pub tasks: TasksSection,
}

/// [router] 段：阈值必须由调用方给出，超时可选（秒）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RouterSection {
    pub threshold: Option<f32>,
    pub resolve_timeout_secs: Option<u64>,
    pub fallback_timeout_secs: Option<u64>,
}

impl RouterSection {
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_secs.map(Duration::from_secs)
    }

    pub fn fallback_timeout(&self) -> Option<Duration> {
        self.fallback_timeout_secs.map(Duration::from_secs)
    }
}

/// [embedding] 段：provider 为 openai / hashing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// 仅 hashing 编码器使用
    pub dimensions: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            api_key: None,
            dimensions: 256,
        }
    }
}

/// [llm] 段：翻译 / 图像任务与对话回退使用的 Chat 模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub vision_model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            vision_model: None,
            base_url: None,
            api_key: None,
        }
    }
}

impl LlmSection {
    /// 配置或环境变量中的 API Key；为空视为未配置
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(&self.model)
    }
}

/// [tasks] 段：启用的内置任务与各任务参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TasksSection {
    /// 内置任务名：translate / web_search / image_captioning / ocr
    pub enabled: Vec<String>,
    pub web_search: WebSearchSection,
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            enabled: vec![
                "translate".into(),
                "web_search".into(),
                "image_captioning".into(),
                "ocr".into(),
            ],
            web_search: WebSearchSection::default(),
        }
    }
}

/// [tasks.web_search] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchSection {
    pub endpoint: String,
    pub max_results: usize,
    pub timeout_secs: u64,
    /// 摘要截断长度（字符）
    pub snippet_chars: usize,
}

impl Default for WebSearchSection {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 5,
            timeout_secs: 15,
            snippet_chars: 150,
        }
    }
}

/// 从 config 目录加载配置，环境变量 MAESTRO__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MAESTRO__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MAESTRO")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert!(cfg.router.threshold.is_none());
        assert!(cfg.router.resolve_timeout().is_none());
        assert_eq!(cfg.embedding.provider, "hashing");
        assert_eq!(cfg.embedding.dimensions, 256);
        assert_eq!(cfg.tasks.enabled.len(), 4);
        assert_eq!(cfg.tasks.web_search.max_results, 5);
        assert_eq!(cfg.llm.vision_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[router]
threshold = 0.4
resolve_timeout_secs = 30

[embedding]
provider = "openai"
model = "text-embedding-3-large"

[tasks.web_search]
max_results = 3
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.router.threshold, Some(0.4));
        assert_eq!(cfg.router.resolve_timeout(), Some(Duration::from_secs(30)));
        assert!(cfg.router.fallback_timeout().is_none());
        assert_eq!(cfg.embedding.provider, "openai");
        assert_eq!(cfg.embedding.model, "text-embedding-3-large");
        assert_eq!(cfg.embedding.dimensions, 256);
        assert_eq!(cfg.tasks.web_search.max_results, 3);
        assert_eq!(cfg.tasks.web_search.snippet_chars, 150);
    }

    #[test]
    fn test_env_overrides_file() {
        std::env::set_var("MAESTRO__LLM__MODEL", "gpt-4o");
        let cfg = load_config(None).unwrap();
        std::env::remove_var("MAESTRO__LLM__MODEL");
        assert_eq!(cfg.llm.model, "gpt-4o");
        assert_eq!(cfg.llm.vision_model(), "gpt-4o");
    }
}
