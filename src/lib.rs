//! Type-safe Rust library for MoTeC LD vehicle telemetry logs.
//!
//! Paddock decodes the proprietary LD binary format written by automotive
//! data loggers: a fixed-layout header, a linked list of channel metadata
//! records threaded through the file by offset pointers, and per-channel raw
//! sample blocks with linear scaling.
//!
//! # Features
//!
//! - **Structured decoding**: header, event/venue/vehicle records, ordered
//!   channel list with per-channel units and sampling rates
//! - **Lazy samples**: raw words are decoded and scaled on first access,
//!   then cached
//! - **Damage tolerance**: truncated captures, garbage string fields and
//!   corrupted channel chains degrade to partial data with diagnostics
//!   instead of failing the whole file
//! - **Tabular export**: row-aligned, NaN-padded columns for downstream
//!   CSV/dataframe tooling
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use paddock::LdReader;
//!
//! fn main() -> paddock::Result<()> {
//!     let reader = LdReader::open("session.ld")?;
//!     println!("{} drove at {}", reader.header().driver, reader.header().venue);
//!
//!     for channel in reader.channels() {
//!         println!("{:32} {:>6} Hz  {}", channel.name, channel.frequency_hz, channel.unit);
//!     }
//!
//!     let table = reader.to_table()?;
//!     println!("{} aligned columns", table.len());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Data source modules
pub mod ld;

// Core exports
pub use error::*;
pub use types::*;

// Data source exports
pub use ld::{Channel, ChannelLayout, Event, LdHeader, LdReader, Vehicle, Venue};
