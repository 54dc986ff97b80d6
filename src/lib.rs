//! Analytics over inspection report collections.
//!
//! Every view here is a pure function of (reports, filters, subject) and is
//! recomputed whole when any input changes:
//!
//! - [`index`]: partitions by display date, inspector and authority
//! - [`filter`]: conjunctive filters, progressive option narrowing
//! - [`correlation`]: per-subject theme/rating correlation, chunked and async
//! - [`stats`]: distributions, weighted themes, profiles
//! - [`search`]: substring search and a debounced live pipeline

pub mod config;
pub mod correlation;
pub mod error;
pub mod filter;
pub mod index;
pub mod loader;
pub mod output;
pub mod search;
pub mod stats;
pub mod types;
pub mod util;

pub use config::EngineConfig;
pub use correlation::{
    filter_correlations, CorrelationAnalyzer, CorrelationFilter, CorrelationResult,
    Dimension, PercentageBand, SubjectSelector, ThemeCorrelation,
};
pub use error::{EngineError, EngineResult};
pub use filter::{apply_filters, filtered_view, FilterChange, FilterSpec, FilteredView};
pub use index::{GroupedView, ReportIndex};
pub use search::{search, LiveSearch, SearchResult};
pub use stats::Profile;
pub use types::Report;
pub use util::{percentage_of, DateParser};
