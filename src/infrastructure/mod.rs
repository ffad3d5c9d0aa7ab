pub mod chrome_page;
pub mod js_executor;
pub mod page_driver;

pub use chrome_page::ChromePage;
pub use js_executor::JsExecutor;
pub use page_driver::{ElementInfo, MutationSubscription, PageDriver};
