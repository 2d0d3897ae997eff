//! # Folio Core
//!
//! The domain layer of the Folio authoring console.
//! This crate holds the content lifecycle, field validation and the access
//! gate. Everything that talks to the outside world sits behind a port.

pub mod console;
pub mod domain;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod normalize;
pub mod ports;
pub mod validation;

pub use console::{ConsoleEntry, ConsoleTab, MatrixConsole};
pub use error::DomainError;
pub use gate::{AccessGate, AccessPolicy, GateStatus, GateView, SignInTarget};
pub use lifecycle::{
    ActionOutcome, Activity, DraftSession, ListState, SessionSnapshot, SessionState,
};
pub use validation::Validation;
