//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Garment workflow commands
pub mod garment;

/// General utility commands
pub mod general;

/// Order money commands
pub mod order;

// Export commands
pub use garment::*;
pub use general::*;
pub use order::*;
