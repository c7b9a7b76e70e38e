//! HTTP handlers for the formgen service.

pub mod forms;
pub mod health;
pub mod metrics;
pub mod questions;
