//! Decompression core: tissue loading, NDL solvers, table fallbacks and
//! stop planning.

pub mod compartment;
pub mod gas;
pub mod history;
pub mod models;
pub mod ndl;
pub mod oxygen;
pub mod padi;
pub mod reference;
pub mod rgbm;
pub mod stops;
pub mod tissue;

pub use compartment::{Compartment, M_VALUE_COMPARTMENTS, ZHL16C_COMPARTMENTS};
pub use gas::GasMix;
pub use history::{accumulate, history_fingerprint, CurrentConditions, DiveSegment};
pub use models::{DecompressionStop, DiveReport, ReferenceReport, StopReason};
pub use ndl::{snapshot_ndl, solve, NdlResult, NdlSmoother};
pub use tissue::{SharedTissueTracker, TissueTensions, TissueTracker};
