//! Device platform boundary.
//!
//! The engine never talks to the device directly; everything it consumes -
//! owner-state queries, restriction mutations, package staging sessions,
//! the user-mediated install handoff, and the asynchronous completion
//! channel - goes through the [`Platform`] trait defined here.
//!
//! [`fake::FakePlatform`] provides an in-memory implementation for unit
//! tests and the CLI harness.

pub mod fake;
pub mod platform;

pub use platform::{
    DeliveryMode, HandoffRef, IntentMutability, OwnerState, Platform, PlatformError,
    PlatformResult, StagingId,
};
