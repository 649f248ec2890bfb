//! Type definitions for registry inventory, exclusion rules and retry policy

mod exclusion;
mod image;
mod retry_policy;

pub use exclusion::*;
pub use image::*;
pub use retry_policy::*;
