//! Core models for mspc: the peaks of each replicate sample, the run
//! configuration, and the error taxonomy shared by the other mspc crates.
//!
//! ```rust
//! use mspc_core::models::{Peak, Sample};
//!
//! let mut sample = Sample::new(0);
//! sample.add(Peak::new("chr1", 10, 20, 1e-6));
//! sample.add(Peak::new("chr1", 5, 8, 1e-3));
//!
//! assert_eq!(sample.peaks("chr1")[0].left, 5);
//! assert!(sample.validate().is_ok());
//! ```

pub mod config;
pub mod errors;
pub mod models;

pub use self::config::{
    Config, ConsensusQuorum, MultipleIntersections, ReplicateType, ResolvedCandidates,
};
pub use self::errors::MspcError;
