pub mod name;
pub mod types;

pub use name::{NAME_PATTERN, validate_application_name};
pub use types::*;
