//! Query Strategy Module
//!
//! - Parallel: fan many selectors out over rayon's pool

pub mod parallel;

pub use parallel::query_parallel;
