//! `vinrec-recon`: VIN inventory reconciliation engine.
//!
//! Pure engine crate: receives decoded feed text and a lookup capability,
//! returns classified results. No CLI or network dependencies.

pub mod classify;
pub mod engine;
pub mod error;
pub mod feed;
pub mod lookup;
pub mod model;
pub mod summary;

pub use classify::StatusCodes;
pub use engine::{reconcile, ReconOptions};
pub use error::ReconError;
pub use lookup::{LookupError, LookupResponse, VinLookup};
pub use model::{Classification, Outcome, ReconResult, Side, TypeFilter};
