//! 页面执行者（相当于注入到页面里的脚本）

pub mod page_actor;
pub mod page_context;

pub use page_actor::PageActor;
pub use page_context::PageContext;
