//! Type definitions for daybrief

mod error;
mod records;

pub use error::*;
pub use records::*;
