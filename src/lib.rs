//! Fidelity-weighted inverse operators for parcel-level source imaging.
//!
//! Synthetic parcel oscillations are pushed through the forward and inverse
//! operators; each source's phase-locking with its parcel decides a signed
//! weight for its row of the inverse operator. `pipeline` holds the
//! end-to-end flow and `core` the individual stages.

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;

pub use error::{FidelityError, Result};
