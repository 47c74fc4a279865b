pub mod executor;
pub mod matcher;
pub mod mode;
pub mod paging;
pub mod ranking;

pub use executor::SearchExecutor;
pub use mode::{SearchMode, UnknownSearchMode};
pub use paging::{PageInfo, SearchPage};
