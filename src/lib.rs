pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::ExpenseError;
pub use crate::core::services::ExpenseService;
pub use crate::infrastructure::storage::{Storage, StorageBackend};

#[cfg(test)]
mod tests;
