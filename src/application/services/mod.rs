//! Application services

pub mod merge;

pub use merge::MergeService;
