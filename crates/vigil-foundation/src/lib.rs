//! Foundation types for vigil: error taxonomy and component lifecycle.

pub mod error;
pub mod lifecycle;

pub use error::*;
pub use lifecycle::*;
