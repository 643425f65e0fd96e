//! Heart disease prediction service.
//!
//! Loads a pre-trained logistic regression and decision tree together with
//! the feature schema and standard scaler they were fitted with, and serves
//! predictions over an HTML form and a JSON API.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;

pub use error::{AppError, Result};
