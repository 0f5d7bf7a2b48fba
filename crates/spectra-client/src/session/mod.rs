//! The caller's authentication and guest status.
//!
//! [`Session`] is a plain value; [`SessionHandle`] publishes it to readers
//! through a watch channel; [`SessionContext`] is the only owner allowed to
//! change it. [`SessionGate`] is the pure write-permission decision derived
//! from a snapshot.

pub mod context;
pub mod gate;
pub mod model;

pub use context::SessionContext;
pub use gate::{GateDecision, SessionGate};
pub use model::{Session, SessionHandle};
