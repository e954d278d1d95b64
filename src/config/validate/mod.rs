//! Configuration validation
//!
//! Validates experiment specifications before anything runs.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::validate_spec;
