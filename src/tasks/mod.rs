//! 任务层：任务描述、解析器抽象、注册表、延迟初始化，以及内置任务（翻译 / Web 搜索 / 图片描述 / OCR）

pub mod builtin;
pub mod lazy;
pub mod registry;
pub mod translate;
pub mod vision;
pub mod web_search;

pub use builtin::{builtin_task, builtin_tasks};
pub use lazy::LazyResolver;
pub use registry::{FnResolver, Resolver, Task, TaskRegistry};
pub use translate::TranslateResolver;
pub use vision::{VisionMode, VisionResolver};
pub use web_search::WebSearchResolver;
