//! Quiz Session Utility Functions
//!
//! ## Current API
//!
//! - Quiz wire model and validation
//! - Answer store for heterogeneous question types
//! - Match-the-following display shuffle
//! - Attempt countdown with threshold events
//! - Pre-submit completeness validation
//!
pub mod answers;
pub mod countdown;
pub mod error;
pub mod quiz;
pub mod shuffle;
pub mod validator;
