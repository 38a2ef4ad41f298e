//! Utility functions for short-code encoding and input validation.
//!
//! - [`base62`] - Counter value to short-code codec
//! - [`url_validator`] - URL normalization and alias validation
//! - [`extract_user`] - Caller identity from HTTP headers

pub mod base62;
pub mod extract_user;
pub mod url_validator;
