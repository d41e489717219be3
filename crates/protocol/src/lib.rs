//! Wire types for the device-management bridge.
//!
//! This crate contains the serde-serializable types shared between the
//! engine, the platform boundary, and the bridge surface. These types
//! represent the "protocol layer" - the shapes of data as they cross
//! component boundaries.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Stable: Changes only when the bridge surface changes
//!
//! The engine behavior built on top of these types lives in `mdm`.

pub mod bridge;
pub mod session;
pub mod status;

pub use bridge::*;
pub use session::*;
pub use status::*;
