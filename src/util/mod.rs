//! Small pure helpers shared by components.

pub mod error_filter;
