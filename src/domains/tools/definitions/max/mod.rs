//! AppLovin MAX reporting tools.
//!
//! Two tools front the MAX reporting API:
//! - `revenue_report`: aggregated mediation statistics from `maxReport`
//! - `cohort_request`: install-cohort analytics from the `maxCohort` family
//!
//! The shared pieces live alongside them: `query` assembles and validates the
//! query parameters (including time-series column expansion), `client` issues
//! the GET and classifies failures, `common` holds the vocabularies both
//! tools accept.

pub mod client;
pub mod cohort;
pub mod common;
pub mod query;
pub mod revenue;

// Re-export domain-specific tools
pub use cohort::{CohortRequestParams, CohortRequestTool};
pub use revenue::{RevenueReportParams, RevenueReportTool};
