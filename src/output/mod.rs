//! Output formatters for scan reports.
//!
//! This module provides different output formats for scan results:
//! - Text audit log (KEEP/REMOVE per bucket) for people
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use romdedupe::duplicates::{FinderConfig, RomFinder};
//! use romdedupe::error::ExitCode;
//! use romdedupe::output::JsonOutput;
//! use romdedupe::resolver::{CanonicalResolver, ResolverCache};
//!
//! let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()));
//! let report = RomFinder::new(FinderConfig::default(), Arc::new(resolver))
//!     .scan(Path::new("roms"))
//!     .unwrap();
//!
//! let output = JsonOutput::new(&report, ExitCode::from_summary(&report.summary));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
