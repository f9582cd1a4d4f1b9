//! 内置任务：按 [tasks] enabled 列表构建；解析器一律延迟初始化，注册时不建立任何连接

use std::sync::Arc;

use super::translate::{self, TranslateResolver};
use super::vision::{self, VisionMode, VisionResolver};
use super::web_search::{self, WebSearchResolver};
use super::{LazyResolver, Resolver, Task};
use crate::config::{AppConfig, LlmSection};
use crate::core::TaskError;
use crate::llm::{LlmClient, OpenAiClient};

fn llm_client(section: &LlmSection) -> Result<Arc<dyn LlmClient>, TaskError> {
    OpenAiClient::from_config(section)
        .map(|c| Arc::new(c) as Arc<dyn LlmClient>)
        .ok_or_else(|| TaskError::Llm("no OPENAI_API_KEY configured".into()))
}

fn translate_task(llm: LlmSection) -> Task {
    let init = move || {
        let llm = llm.clone();
        async move {
            let resolver: Arc<dyn Resolver<String>> =
                Arc::new(TranslateResolver::new(llm_client(&llm)?));
            Ok::<_, TaskError>(resolver)
        }
    };
    Task::new(translate::NAME, translate::DESCRIPTION, LazyResolver::new(init))
}

fn vision_task(llm: LlmSection, mode: VisionMode) -> Task {
    let init = move || {
        let llm = llm.clone();
        async move {
            let resolver: Arc<dyn Resolver<String>> =
                Arc::new(VisionResolver::new(llm_client(&llm)?, mode));
            Ok::<_, TaskError>(resolver)
        }
    };
    let (name, description) = match mode {
        VisionMode::Caption => (vision::CAPTION_NAME, vision::CAPTION_DESCRIPTION),
        VisionMode::Ocr => (vision::OCR_NAME, vision::OCR_DESCRIPTION),
    };
    Task::new(name, description, LazyResolver::new(init))
}

fn web_search_task(config: &AppConfig) -> Task {
    let section = config.tasks.web_search.clone();
    let init = move || {
        let section = section.clone();
        async move {
            let resolver: Arc<dyn Resolver<String>> = Arc::new(WebSearchResolver::new(&section)?);
            Ok::<_, TaskError>(resolver)
        }
    };
    Task::new(web_search::NAME, web_search::DESCRIPTION, LazyResolver::new(init))
}

/// 按名称构建单个内置任务；未知名称返回 None
pub fn builtin_task(name: &str, config: &AppConfig) -> Option<Task> {
    match name {
        "translate" => Some(translate_task(config.llm.clone())),
        "web_search" => Some(web_search_task(config)),
        "image_captioning" => Some(vision_task(config.llm.clone(), VisionMode::Caption)),
        "ocr" => Some(vision_task(config.llm.clone(), VisionMode::Ocr)),
        _ => None,
    }
}

/// 按 enabled 顺序构建内置任务；未知名称记录警告后跳过
pub fn builtin_tasks(config: &AppConfig) -> Vec<Task> {
    config
        .tasks
        .enabled
        .iter()
        .filter_map(|name| {
            let task = builtin_task(name, config);
            if task.is_none() {
                tracing::warn!(task = %name, "unknown builtin task, skipped");
            }
            task
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_order_and_unknown_skipped() {
        let mut config = AppConfig::default();
        config.tasks.enabled = vec!["ocr".into(), "nope".into(), "translate".into()];
        let tasks = builtin_tasks(&config);
        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec![vision::OCR_NAME, translate::NAME]);
    }

    #[test]
    fn test_default_set() {
        let tasks = builtin_tasks(&AppConfig::default());
        assert_eq!(tasks.len(), 4);
        assert!(tasks.iter().all(|t| !t.description().is_empty()));
    }

    #[tokio::test]
    async fn test_llm_task_without_key_fails_on_first_use() {
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        let task = builtin_task("translate", &AppConfig::default()).unwrap();
        assert!(matches!(task.resolve("bonjour").await, Err(TaskError::Llm(_))));
    }
}
