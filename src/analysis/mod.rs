//! Analysis modules.
//!
//! Segmentation of observation series into intervals and the majority
//! vote computed over each of them.

pub mod aggregator;

pub use aggregator::*;
