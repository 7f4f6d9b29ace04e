pub mod roots;
pub mod walk;

pub use roots::build_search_roots;
pub use walk::{CrawlStats, FilesystemCrawler};
