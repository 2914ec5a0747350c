pub mod achievement;
pub mod category;
pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod notifications;
pub mod occurrence;
pub mod recurrence;
pub mod service;
pub mod stats;
pub mod streak;
pub mod task;

pub use crate::error::{Result, TodoError};
pub use crate::service::{TodoService, TodoServiceBuilder};
