mod cache;
mod loader;

pub use cache::PoolCache;
pub use loader::{LoadError, classify, scan_stimuli};

pub type Result<T> = std::result::Result<T, LoadError>;
