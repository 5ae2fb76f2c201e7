pub mod page;

pub use page::{total_pages, PageQuery, PageRequest, PageResult};
