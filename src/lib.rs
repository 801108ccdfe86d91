//! Consolidates the `.t2t` text exports of a terahertz scanner into one flat
//! table.
//!
//! Every `.t2t` file found under a root folder is parsed into a grid of
//! `X, Y, Z, channel…` rows, tagged with the sample, scan and authenticity
//! label encoded in its folder name (`s07-2-A`), and appended to a single
//! CSV (or Parquet) file:
//!
//! ```text
//! Sample,Scan,Location,AC,X,Y,Z,1,2,…
//! 07,2,1,Authentic,0,0,1.5,0.013,0.021,…
//! ```
//!
//! [`pipeline::run`] drives the whole batch from an [`config::ExportConfig`].

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use pipeline::{run, BatchReport};
