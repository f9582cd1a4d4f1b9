//! 延迟初始化的解析器：首次调用时构建内部解析器（客户端、模型连接等），之后复用

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::Resolver;
use crate::core::TaskError;

/// 首次 resolve 时调用 init 构建真正的解析器；init 失败不缓存，下次调用重试
pub struct LazyResolver<R, F> {
    init: F,
    inner: OnceCell<Arc<dyn Resolver<R>>>,
}

impl<R, F> LazyResolver<R, F> {
    pub fn new(init: F) -> Self {
        Self {
            init,
            inner: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }
}

#[async_trait]
impl<R, F, Fut> Resolver<R> for LazyResolver<R, F>
where
    R: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn Resolver<R>>, TaskError>> + Send + 'static,
{
    async fn resolve(&self, query: &str) -> Result<R, TaskError> {
        let inner = self.inner.get_or_try_init(|| (self.init)()).await?;
        inner.resolve(query).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::tasks::FnResolver;

    #[tokio::test]
    async fn test_initializes_once_on_first_call() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let lazy: Arc<LazyResolver<String, _>> = Arc::new(LazyResolver::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let inner: Arc<dyn Resolver<String>> =
                    Arc::new(FnResolver(|q: &str| Ok::<_, TaskError>(q.to_uppercase())));
                Ok::<_, TaskError>(inner)
            }
        }));
        assert!(!lazy.is_initialized());
        assert_eq!(inits.load(Ordering::SeqCst), 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let l = lazy.clone();
                tokio::spawn(async move { l.resolve("hi").await })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "HI");
        }
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[tokio::test]
    async fn test_init_failure_surfaces_and_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let lazy: LazyResolver<String, _> = LazyResolver::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<Arc<dyn Resolver<String>>, _>(TaskError::Llm("no api key".into()))
            }
        });
        assert!(matches!(lazy.resolve("q").await, Err(TaskError::Llm(_))));
        assert!(lazy.resolve("q").await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
