pub mod bulk;
pub mod catalog;
pub mod errors;
pub mod query;
pub mod status;
pub mod territory;

pub use errors::{ErrorCode, ServiceError, ServiceResult};

/// Page size of paginated listings.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;
