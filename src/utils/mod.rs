//! Utility modules

pub mod string;

pub use string::{mask_secret, truncate_str};
