pub mod crawlers;
pub mod domain;
pub mod models;
pub mod processing;
pub mod repository;

/// Smallest number of recommendations a caller may request.
pub const MIN_TOP_K: usize = 1;

/// Largest number of recommendations a caller may request.
pub const MAX_TOP_K: usize = 10;

/// Number of recommendations returned when a request does not specify one.
pub const DEFAULT_TOP_K: usize = 5;
