//! 任务注册表
//!
//! 每个任务由名称、自然语言描述与解析器组成，注册后不可变；注册顺序即嵌入索引顺序。
//! 名称不要求唯一（重名只会让日志产生歧义）。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::TaskError;

/// 解析器：给定请求文本，产出结果或失败
#[async_trait]
pub trait Resolver<R>: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<R, TaskError>;
}

/// 把同步闭包包装为解析器
pub struct FnResolver<F>(pub F);

#[async_trait]
impl<R, F> Resolver<R> for FnResolver<F>
where
    R: Send + 'static,
    F: Fn(&str) -> Result<R, TaskError> + Send + Sync,
{
    async fn resolve(&self, query: &str) -> Result<R, TaskError> {
        (self.0)(query)
    }
}

/// 任务描述：不可变，克隆只复制 Arc
pub struct Task<R = String> {
    name: String,
    description: String,
    resolver: Arc<dyn Resolver<R>>,
}

impl<R> Task<R> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        resolver: impl Resolver<R> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            resolver: Arc::new(resolver),
        }
    }

    /// 由同步闭包创建
    pub fn from_fn<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        R: Send + 'static,
        F: Fn(&str) -> Result<R, TaskError> + Send + Sync + 'static,
    {
        Self::new(name, description, FnResolver(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub async fn resolve(&self, query: &str) -> Result<R, TaskError> {
        self.resolver.resolve(query).await
    }
}

impl<R> Clone for Task<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<R> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// 有序任务列表
pub struct TaskRegistry<R = String> {
    tasks: Vec<Task<R>>,
}

impl<R> TaskRegistry<R> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// 追加任务，返回其位置
    pub fn register(&mut self, task: Task<R>) -> usize {
        self.tasks.push(task);
        self.tasks.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Task<R>> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task<R>> {
        self.tasks.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name.clone()).collect()
    }

    /// 按注册顺序返回描述，用于批量编码
    pub fn descriptions(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.description.clone()).collect()
    }
}

impl<R> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FromIterator<Task<R>> for TaskRegistry<R> {
    fn from_iter<I: IntoIterator<Item = Task<R>>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}
