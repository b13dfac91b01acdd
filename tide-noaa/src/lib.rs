//! Core types and NOAA CO-OPS client for coastal tide-gauge series.
//!
//! The `api` feature pulls in `reqwest`/`tokio` for the network fetcher;
//! without it the crate only carries the data model and the hourly CSV
//! schema, which is all the merge/reduce stages need.

pub mod error;
pub mod observation;
pub mod request;
pub mod schema;
pub mod source;
pub mod station;
pub mod year_window;

#[cfg(feature = "api")]
pub mod client;
#[cfg(feature = "api")]
pub mod fetcher;
