pub mod cell;
pub mod country;
pub mod dataset;
pub mod error;
pub mod source;

pub use country::*;
pub use dataset::*;
pub use error::ReferenceError;
pub use source::*;
