//! # Palisade Core
//!
//! Domain models and pure scoring logic for Palisade - wallet reputation
//! for verification gating.
//!
//! This crate holds everything that can be computed without I/O: the wallet
//! activity snapshot, the weighted trust score, the trust tier and
//! verification mode classifications, and the deterministic fallback score
//! used when live ledger data is unavailable.

pub mod error;
pub mod fallback;
pub mod models;
pub mod scoring;

pub use error::*;
pub use fallback::*;
pub use models::*;
pub use scoring::*;
