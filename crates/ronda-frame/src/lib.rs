#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Shape-tagged datasets for the ronda research toolkit.
//!
//! A [`Dataset`] is a Polars `DataFrame` together with the columns that act
//! as its index. The classifier turns the index structure into a [`Shape`]
//! exactly once, and a [`Frame`] carries that tag alongside the data so that
//! downstream operations (selection, rolling aggregation, statistics) branch
//! on the tag instead of re-inspecting the index.

/// The version of the ronda-frame crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod frame;
pub mod keys;
pub mod period;
pub mod select;
pub mod shape;
pub mod stats;
pub mod types;

pub use error::{Result, RondaError};
pub use frame::Frame;
pub use period::{Period, Periods};
pub use select::{Pick, Selected, Selector, unstack};
pub use shape::{Shape, ShapeTag, classify};
pub use types::{Arity, Dataset, Date};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
