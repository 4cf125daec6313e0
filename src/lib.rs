//! Recreational dive decompression algorithms.
//!
//! Tracks inert-gas loading in a set of tissue compartments, derives the
//! no-decompression limit (NDL) from it, and plans stops once the limit is
//! used up. [`DiveSession`] wires the pieces into one dive's state machine;
//! the [`deco`] modules can also be used on their own.
//!
//! ```
//! use chrono::Utc;
//! use divalgo::{DecoSettings, DiveSession};
//!
//! let now = Utc::now();
//! let mut session = DiveSession::new(DecoSettings::default(), now);
//! session.descend(now);
//! let report = session.report(now);
//! assert_eq!(report.depth_m, 10.0);
//! ```

pub mod config;
pub mod deco;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod units;

pub use config::{CompartmentSet, DecoModelKind, DecoSettings};
pub use error::{ConfigError, DecoError, ReferenceError, Result};
pub use session::DiveSession;
