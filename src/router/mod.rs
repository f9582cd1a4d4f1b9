//! 路由层：任务嵌入索引、路由决策、回退与 Router 本体

pub mod decision;
pub mod dispatch;
pub mod fallback;
pub mod index;

pub use decision::{select_best, RoutingDecision, TaskScore};
pub use dispatch::{RequestOptions, Router, RouterBuilder, RouterConfig};
pub use fallback::{ChatFallback, Fallback, FnFallback, NoMatchSentinel, StaticFallback};
pub use index::TaskIndex;
