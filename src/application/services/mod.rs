//! Business logic services for the application layer.

pub mod distributed_counter;
pub mod short_code_generator;
pub mod url_service;

pub use distributed_counter::{DEFAULT_COUNTER_KEY, DistributedCounter};
pub use short_code_generator::ShortCodeGenerator;
pub use url_service::{CreateUrl, UpdateUrl, UrlService};
