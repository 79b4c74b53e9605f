//! AppLovin MAX cohort report tool.
//!
//! Retrieves install-cohort performance data (revenue, impression or session
//! metrics per install date). Time-series metrics are expanded into one
//! column per tracked day before the request goes out, so `ads_rpi` with
//! `cohort_interval` 7 is sent as `ads_rpi_0,...,ads_rpi_7`.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::core::config::Config;

use super::client::{
    self, COHORT_IMPRESSION_PATH, COHORT_REVENUE_PATH, COHORT_SESSION_PATH,
};
use super::common::{ReportFormat, SortDirection, error_result, parse_params, success_result};
use super::query::{
    CasePolicy, COHORT_INTERVALS, QueryFilter, QuerySort, ReportArguments, assemble_query,
};

/// Columns accepted by the cohort endpoints.
pub const COHORT_COLUMNS: [&str; 21] = [
    "day",
    "installs",
    "country",
    "platform",
    "package_name",
    "application",
    "ads_rpi",
    "iap_rpi",
    "pub_revenue",
    "inter_rpi",
    "banner_rpi",
    "reward_rpi",
    "imp",
    "imp_per_user",
    "banner_imp",
    "inter_imp",
    "reward_imp",
    "retention",
    "sessions",
    "session_length",
    "daily_usage",
];

/// Columns used when the caller does not ask for any.
pub const DEFAULT_COHORT_COLUMNS: [&str; 2] = ["day", "installs"];

fn default_cohort_columns() -> Vec<String> {
    DEFAULT_COHORT_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect()
}

fn default_cohort_type() -> String {
    "revenue".to_string()
}

fn cohort_type_schema(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "string",
        "enum": ["revenue", "impression", "session"],
        "default": "revenue",
        "description": "Type of cohort data to retrieve: 'revenue' for ad revenue/IAP metrics (default), 'impression' for ad impression data, 'session' for retention/session metrics"
    })
}

fn cohort_columns_schema(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "array",
        "items": { "type": "string", "enum": COHORT_COLUMNS },
        "default": DEFAULT_COHORT_COLUMNS,
        "description": "Metrics to include in the report. Time-based metrics (_rpi/_imp/_retention suffixes, imp_per_user, pub_revenue, sessions, session_length, daily_usage) require cohort_interval. Common dimensions: day (install date), installs, country, platform, package_name, application. Revenue metrics: ads_rpi, iap_rpi, pub_revenue, inter_rpi/banner_rpi/reward_rpi. Impression metrics: imp, imp_per_user, banner_imp, inter_imp, reward_imp. Session metrics: retention, sessions, session_length, daily_usage."
    })
}

fn cohort_interval_schema(_generator: &mut SchemaGenerator) -> Schema {
    let allowed: Vec<String> = COHORT_INTERVALS
        .iter()
        .map(|days| days.to_string())
        .collect();
    json_schema!({
        "type": "string",
        "enum": allowed,
        "description": "Required when using time-based metrics. How many days post-install to track: each time-based metric expands into one column per day from 0 through the interval (cohort_interval=7 yields ads_rpi_0 through ads_rpi_7). Use 0 for install day only, 7 for the first week, 30 for the first month, 45 for the maximum range."
    })
}

/// Parameters for the cohort report tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CohortRequestParams {
    #[serde(default = "default_cohort_type")]
    #[schemars(schema_with = "cohort_type_schema")]
    pub cohort_type: String,

    /// Cohorts are keyed by install date, so the range selects installs.
    #[schemars(
        description = "Start date for the cohort analysis in YYYY-MM-DD format. This is the installation date to start from."
    )]
    pub start: String,

    #[schemars(
        description = "End date for the cohort analysis in YYYY-MM-DD format. Maximum 45-day range from start date."
    )]
    pub end: String,

    #[schemars(
        description = "Response format: 'json' for structured data or 'csv' for comma-separated values"
    )]
    pub format: ReportFormat,

    #[serde(default = "default_cohort_columns")]
    #[schemars(schema_with = "cohort_columns_schema")]
    pub columns: Vec<String>,

    #[schemars(schema_with = "cohort_interval_schema")]
    pub cohort_interval: Option<String>,

    #[schemars(description = "Filter results to a country, two letter ISO code (e.g. 'US', 'JP')")]
    pub filter_country: Option<String>,

    #[schemars(description = "Filter results to a specific app package name (e.g. 'com.example.app')")]
    pub filter_package_name: Option<String>,

    #[schemars(description = "Filter results to a platform: 'android' or 'ios'")]
    pub filter_platform: Option<String>,

    #[schemars(description = "Filter results to a specific application name")]
    pub filter_application: Option<String>,

    #[schemars(description = "Sort results by installation day, ascending (ASC) or descending (DESC)")]
    pub sort_day: Option<SortDirection>,

    #[schemars(description = "Sort results by number of installs, ascending (ASC) or descending (DESC)")]
    pub sort_installs: Option<SortDirection>,

    #[schemars(description = "Limit the number of results returned (for pagination)")]
    pub limit: Option<f64>,

    #[schemars(description = "Skip the first N results (for pagination, use with limit)")]
    pub offset: Option<f64>,

    #[schemars(description = "When true, exclude rows where all metric values are zero")]
    pub not_zero: Option<bool>,
}

/// Cohort report tool implementation.
#[derive(Debug, Clone)]
pub struct CohortRequestTool;

impl CohortRequestTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "cohort_request";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Retrieve user cohort performance data segmented by installation date from the \
         AppLovin MAX cohort API. Use this to analyze how revenue, impressions or sessions \
         evolve over time for users who installed on specific dates. Choose cohort_type based \
         on the metrics needed: 'revenue' for ad revenue and IAP, 'impression' for ad \
         impressions, 'session' for retention and usage patterns.";

    pub fn new() -> Self {
        Self
    }

    /// Pick the endpoint for a cohort type. Unknown values fall back to the
    /// revenue endpoint, mirroring the schema default.
    fn endpoint_path(cohort_type: &str) -> &'static str {
        match cohort_type {
            "impression" => COHORT_IMPRESSION_PATH,
            "session" => COHORT_SESSION_PATH,
            "revenue" => COHORT_REVENUE_PATH,
            other => {
                debug!("Unknown cohort_type '{}', using the revenue endpoint", other);
                COHORT_REVENUE_PATH
            }
        }
    }

    /// Execute the tool logic. Blocking; run via `spawn_blocking`.
    pub fn execute(params: &CohortRequestParams, config: &Config) -> CallToolResult {
        info!(
            "Requesting MAX {} cohort report from {} to {}",
            params.cohort_type, params.start, params.end
        );

        let arguments = ReportArguments {
            start: &params.start,
            end: &params.end,
            format: params.format,
            columns: &params.columns,
            cohort_interval: params.cohort_interval.as_deref(),
            expand_time_series: true,
            filters: vec![
                QueryFilter {
                    name: "country",
                    value: params.filter_country.as_deref(),
                    case: CasePolicy::Lowercase,
                },
                QueryFilter {
                    name: "package_name",
                    value: params.filter_package_name.as_deref(),
                    case: CasePolicy::Verbatim,
                },
                QueryFilter {
                    name: "platform",
                    value: params.filter_platform.as_deref(),
                    case: CasePolicy::Lowercase,
                },
                QueryFilter {
                    name: "application",
                    value: params.filter_application.as_deref(),
                    case: CasePolicy::Verbatim,
                },
            ],
            sorts: vec![
                QuerySort {
                    name: "day",
                    direction: params.sort_day,
                },
                QuerySort {
                    name: "installs",
                    direction: params.sort_installs,
                },
            ],
            limit: params.limit,
            offset: params.offset,
            not_zero: params.not_zero,
        };

        let query = match assemble_query(&arguments, config.credentials.applovin_api_key.as_deref())
        {
            Ok(query) => query,
            Err(e) => return error_result(&e.to_string()),
        };

        let endpoint = Self::endpoint_path(&params.cohort_type);
        match client::fetch_report(&config.max_api.base_url, endpoint, &query) {
            Ok(body) => {
                info!("Cohort report fetched ({} bytes)", body.len());
                success_result(body)
            }
            Err(e) => {
                error!("Cohort report request failed: {}", e);
                error_result(&e.to_string())
            }
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<CohortRequestParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(config: Arc<Config>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let config = config.clone();
            async move {
                let params: CohortRequestParams = match parse_params(args) {
                    Ok(params) => params,
                    Err(result) => return Ok(result),
                };

                // reqwest::blocking creates its own runtime, so the request
                // runs on a blocking thread.
                let result = tokio::task::spawn_blocking(move || Self::execute(&params, &config))
                    .await
                    .unwrap_or_else(|e| error_result(&format!("Task failed: {:?}", e)));

                Ok(result)
            }
            .boxed()
        })
    }
}

impl Default for CohortRequestTool {
    fn default() -> Self {
        Self::new()
    }
}
