pub mod percentiles;
pub mod stream;
pub mod summary;

pub use summary::RunSummary;
