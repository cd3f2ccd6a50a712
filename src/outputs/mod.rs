//! Output generation for aggregation and discovery results.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2024-01-03/
//!     ├── feed.json      # the aggregated, date-sorted article feed
//!     └── sources.json   # candidate sources from discovery (with --discover)
//! ```

pub mod json;
