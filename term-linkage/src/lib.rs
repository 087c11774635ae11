//! # term-linkage - Blocking rule analysis for record linkage
//!
//! Record linkage finds records that refer to the same entity by comparing
//! pairs of records. Comparing every pair is quadratic, so linkage tools
//! restrict comparisons with *blocking rules*: only records that agree on a
//! column such as `surname` or `city` are compared.
//!
//! term-linkage estimates how well an ordered list of blocking rules works
//! before any linkage runs. It needs only the row count of the table and
//! the number of distinct values of each blocking column, which it reads
//! through DataFusion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datafusion::prelude::*;
//! use term_linkage::prelude::*;
//! use term_linkage::formatters::HumanFormatter;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let ctx = SessionContext::new();
//! ctx.register_csv("people", "people.csv", CsvReadOptions::new()).await?;
//! let stats = DataFusionStatistics::new(ctx);
//! let row_count = stats.row_count("people").await?;
//!
//! let analyzer = BlockingAnalyzer::new(stats);
//! let report = analyzer
//!     .report("people", &["l.surname = r.surname", "l.city = r.city"], row_count)
//!     .await?;
//!
//! println!("{}", HumanFormatter::new().format(&report)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## How rules are scored
//!
//! For a table of `n` rows the unblocked work is `n * (n - 1) / 2` pairs.
//! Blocking on a column with `c` distinct values is modelled as `c` equal
//! blocks of `n / c` rows. Each rule is measured against the comparisons
//! left by the rule before it, and gets an efficiency score from 0 to 100
//! that blends that reduction (weight 0.7) with the column's distinct ratio
//! (weight 0.3). See [`analysis`] for the details and
//! [`config::AnalyzerConfig`] to change the weights.
//!
//! ## Supported rules
//!
//! Single-column equality between two record aliases, such as
//! `l.surname = r.surname` or `block_on('surname')`. Compound rules are
//! accepted but skipped with a warning, since their cardinality cannot be
//! read from one column.
//!
//! ## Modules
//!
//! - [`rules`]: parsing blocking rule text
//! - [`statistics`]: distinct-count providers (DataFusion, in-memory, cached)
//! - [`analysis`]: analyzer, summary, recommendations and rule reordering
//! - [`profile`]: per-column null rates and cardinalities
//! - [`formatters`]: JSON, text and Markdown reports
//! - [`config`], [`logging`], [`security`], [`error`]: supporting pieces

pub mod analysis;
pub mod config;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod profile;
pub mod rules;
pub mod security;
pub mod statistics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
