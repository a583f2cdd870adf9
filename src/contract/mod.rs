//! The analytics payload contract.
//!
//! Defines the shape of the `/api/analysis` response and validates raw
//! bytes against it.

pub mod checks;
pub mod decode;
pub mod models;

pub use checks::{check_ordering, OrderingWarning};
pub use decode::{decode, decode_value, DecodeError, DecodeErrorKind};
pub use models::*;
