//! Core domain types for the TMS remote trading client.
//!
//! This crate provides the fundamental types used throughout the client:
//! - `TargetId`, `OrderId`: identifiers assigned by the remote service
//! - `FieldMap`: the string/numeric field mapping carried by events and
//!   request messages
//! - `Side`, `OrdType`, `WaveSizeType`: numeric trading enums
//! - Well-known field name constants (`fields` module)

pub mod enums;
pub mod error;
pub mod fields;
pub mod ids;

pub use enums::{OrdType, Side, WaveSizeType};
pub use error::{CoreError, Result};
pub use fields::FieldMap;
pub use ids::{OrderId, TargetId};
