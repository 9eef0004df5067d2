//! CLI command implementations.

pub mod calibrate;
pub mod common;
pub mod correct;
pub mod run;
pub mod version;
