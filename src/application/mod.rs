//! Application services layer.

pub mod comments;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod share;
