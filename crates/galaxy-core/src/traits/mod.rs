//! Core traits defined in `galaxy-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
