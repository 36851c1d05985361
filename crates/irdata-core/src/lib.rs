//! Core types and reconciliation logic for the irdata loader.
//!
//! Date-range normalisation, composite keys, the COW/KSG interval merge, the
//! override table and the year projector live here, together with the
//! [`IrStore`](store::IrStore) trait they persist through. This crate has no
//! database or file-format dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contiguity;
pub mod dataset;
pub mod date;
pub mod dispute;
pub mod error;
pub mod factor;
pub mod keys;
pub mod link;
pub mod merge;
pub mod overrides;
pub mod pipeline;
pub mod project;
pub mod record;
pub mod row;
pub mod state;
pub mod store;
pub mod war;
pub mod war3;

pub use error::{Error, Result};
