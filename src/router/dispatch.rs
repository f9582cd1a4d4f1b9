//! 语义任务路由器
//!
//! 请求流程：Received → Encoded → Scored → {Dispatched | FallenBack} → {Succeeded | Failed}。
//! 编码器与任务索引各由一个 OnceCell 守护：并发首次调用只初始化一次，之后只读、无锁。
//! 解析器 / 回退可选超时与取消；Router 自身不重试。

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::decision::RoutingDecision;
use super::fallback::{Fallback, NoMatchSentinel};
use super::index::TaskIndex;
use crate::config::RouterSection;
use crate::core::{RouterError, TaskError};
use crate::embedding::{EmbeddingProvider, Encoder};
use crate::tasks::{Task, TaskRegistry};

/// 路由配置：阈值由调用方给出，没有内置默认值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    pub threshold: f32,
    pub resolve_timeout: Option<Duration>,
    pub fallback_timeout: Option<Duration>,
}

impl RouterConfig {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            resolve_timeout: None,
            fallback_timeout: None,
        }
    }

    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = Some(timeout);
        self
    }

    /// 从 [router] 段构建；未配置阈值或阈值不是有限数时返回 InvalidConfig
    pub fn from_section(section: &RouterSection) -> Result<Self, RouterError> {
        let threshold = section
            .threshold
            .ok_or_else(|| RouterError::InvalidConfig("router.threshold is not configured".into()))?;
        let config = Self {
            threshold,
            resolve_timeout: section.resolve_timeout(),
            fallback_timeout: section.fallback_timeout(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 阈值必须是有限数
    pub fn validate(&self) -> Result<(), RouterError> {
        if !self.threshold.is_finite() {
            return Err(RouterError::InvalidConfig(format!(
                "router.threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// 单次请求选项：覆盖超时（同时作用于解析器与回退），可选取消令牌
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// 在可选超时与取消下等待解析器 / 回退
async fn guarded<T>(
    fut: impl Future<Output = Result<T, TaskError>>,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<T, TaskError> {
    let timed = async {
        match timeout {
            Some(d) => tokio::time::timeout(d, fut)
                .await
                .map_err(|_| TaskError::Timeout(d))?,
            None => fut.await,
        }
    };
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(TaskError::Cancelled),
            r = timed => r,
        },
        None => timed.await,
    }
}

/// Router 构建器
pub struct RouterBuilder<R = String> {
    registry: TaskRegistry<R>,
    provider: Option<EmbeddingProvider>,
    config: RouterConfig,
}

impl<R: Send + 'static> RouterBuilder<R> {
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.provider = Some(EmbeddingProvider::new(encoder));
        self
    }

    pub fn provider(mut self, provider: EmbeddingProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn task(mut self, task: Task<R>) -> Self {
        self.registry.register(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task<R>>) -> Self {
        for task in tasks {
            self.registry.register(task);
        }
        self
    }

    /// 构建但不初始化：编码器加载与索引构建推迟到首次请求
    pub fn build_lazy(self) -> Result<Router<R>, RouterError> {
        self.config.validate()?;
        if self.registry.is_empty() {
            return Err(RouterError::EmptyRegistry);
        }
        let provider = self
            .provider
            .ok_or_else(|| RouterError::EncoderUnavailable("no encoder configured".into()))?;
        tracing::info!(tasks = ?self.registry.names(), threshold = self.config.threshold, "router initialized");
        Ok(Router {
            registry: self.registry,
            provider,
            index: OnceCell::new(),
            config: self.config,
        })
    }

    /// 构建并立即加载编码器、构建索引；编码器不可用时在此处失败
    pub async fn build(self) -> Result<Router<R>, RouterError> {
        let router = self.build_lazy()?;
        router.warm_up().await?;
        Ok(router)
    }
}

/// 语义任务路由器：拥有自己的注册表、编码器与索引（不是进程级单例）
pub struct Router<R = String> {
    registry: TaskRegistry<R>,
    provider: EmbeddingProvider,
    index: OnceCell<TaskIndex>,
    config: RouterConfig,
}

impl<R: Send + 'static> Router<R> {
    pub fn builder(config: RouterConfig) -> RouterBuilder<R> {
        RouterBuilder {
            registry: TaskRegistry::new(),
            provider: None,
            config,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// 注册表永不为空（构建时已检查）
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn task_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn task(&self, index: usize) -> Option<&Task<R>> {
        self.registry.get(index)
    }

    /// 已构建的索引行数；尚未构建时为 None
    pub fn index_len(&self) -> Option<usize> {
        self.index.get().map(|i| i.len())
    }

    /// 加载编码器并构建索引（幂等）
    pub async fn warm_up(&self) -> Result<(), RouterError> {
        self.index().await.map(|_| ())
    }

    async fn index(&self) -> Result<&TaskIndex, RouterError> {
        self.index
            .get_or_try_init(|| TaskIndex::build(&self.registry, &self.provider))
            .await
    }

    /// 追加任务并作废索引；下一次请求按当前注册表重建
    pub fn register(&mut self, task: Task<R>) -> usize {
        let slot = self.registry.register(task);
        self.index = OnceCell::new();
        tracing::info!(tasks = self.registry.len(), "task registered, embedding index invalidated");
        slot
    }

    /// 对查询打分并给出完整决策
    pub async fn decide(&self, query: &str) -> Result<RoutingDecision, RouterError> {
        let index = self.index().await?;
        let q = self.provider.encode_one(query).await?;
        tracing::debug!(state = "encoded", dim = q.dim());
        let scores = index.scores(&q)?;
        tracing::debug!(state = "scored");

        for (task, score) in self.registry.iter().zip(&scores) {
            tracing::info!(task = %task.name(), score = *score, "task score {:.3}", score);
        }

        let decision = RoutingDecision::new(&self.registry.names(), scores, self.config.threshold)
            .ok_or(RouterError::EmptyRegistry)?;
        if decision.accepted {
            tracing::info!(
                task = %decision.best_name,
                score = decision.best_score,
                "routed to {} at score {:.3}",
                decision.best_name,
                decision.best_score
            );
        } else {
            tracing::info!(
                threshold = self.config.threshold,
                best = %decision.best_name,
                score = decision.best_score,
                "no task above threshold {:.3}; using fallback",
                self.config.threshold
            );
        }
        Ok(decision)
    }

    /// 返回最佳任务；最佳得分低于阈值时返回 None
    pub async fn route(&self, query: &str) -> Result<Option<&Task<R>>, RouterError> {
        let decision = self.decide(query).await?;
        Ok(decision.selected().and_then(|i| self.registry.get(i)))
    }

    /// 路由并执行：命中则调用任务解析器，否则调用回退；都没有时返回固定结果
    pub async fn handle_request(
        &self,
        query: &str,
        fallback: Option<&dyn Fallback<R>>,
    ) -> Result<R, RouterError>
    where
        R: NoMatchSentinel,
    {
        self.handle_request_with(query, fallback, &RequestOptions::default())
            .await
    }

    /// 同 handle_request，可覆盖超时并传入取消令牌
    pub async fn handle_request_with(
        &self,
        query: &str,
        fallback: Option<&dyn Fallback<R>>,
        options: &RequestOptions,
    ) -> Result<R, RouterError>
    where
        R: NoMatchSentinel,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request", id = %request_id);
        let start = Instant::now();
        let result = self
            .dispatch(query, fallback, options)
            .instrument(span.clone())
            .await;

        let (target, outcome) = match &result {
            Ok((target, _)) => (target.clone(), "ok"),
            Err(RouterError::TaskResolutionFailed { task_name, .. }) => (task_name.clone(), "task_error"),
            Err(RouterError::FallbackFailed { .. }) => ("fallback".to_string(), "fallback_error"),
            Err(_) => (String::new(), "routing_error"),
        };
        let audit = serde_json::json!({
            "event": "route_audit",
            "request_id": request_id.to_string(),
            "target": target,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        span.in_scope(|| tracing::info!(audit = %audit.to_string(), "route"));

        result.map(|(_, value)| value)
    }

    async fn dispatch(
        &self,
        query: &str,
        fallback: Option<&dyn Fallback<R>>,
        options: &RequestOptions,
    ) -> Result<(String, R), RouterError>
    where
        R: NoMatchSentinel,
    {
        tracing::debug!(state = "received", query_len = query.len());
        let decision = self.decide(query).await?;
        let cancel = options.cancel.as_ref();

        if let Some(task) = decision.selected().and_then(|i| self.registry.get(i)) {
            tracing::debug!(state = "dispatched", task = %task.name());
            let timeout = options.timeout.or(self.config.resolve_timeout);
            return match guarded(task.resolve(query), timeout, cancel).await {
                Ok(value) => {
                    tracing::debug!(state = "succeeded");
                    Ok((task.name().to_string(), value))
                }
                Err(cause) => {
                    tracing::warn!(state = "failed", task = %task.name(), error = %cause, "task resolver failed");
                    Err(RouterError::TaskResolutionFailed {
                        task_name: task.name().to_string(),
                        cause,
                    })
                }
            };
        }

        tracing::debug!(state = "fallen_back", has_fallback = fallback.is_some());
        let Some(fallback) = fallback else {
            return Ok(("sentinel".to_string(), R::no_suitable_task()));
        };
        let timeout = options.timeout.or(self.config.fallback_timeout);
        match guarded(fallback.call(query), timeout, cancel).await {
            Ok(value) => {
                tracing::debug!(state = "succeeded");
                Ok(("fallback".to_string(), value))
            }
            Err(cause) => {
                tracing::warn!(state = "failed", error = %cause, "fallback failed");
                Err(RouterError::FallbackFailed { cause })
            }
        }
    }
}
