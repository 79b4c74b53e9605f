//! AppLovin MAX revenue report tool.
//!
//! Requests aggregated mediation statistics (impressions, requests, fill
//! rate, eCPM, estimated revenue) from the `maxReport` endpoint and relays
//! the raw response to the caller.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Deserialize;
use tracing::{error, info};

use crate::core::config::Config;

use super::client::{self, REVENUE_REPORT_PATH};
use super::common::{ReportFormat, SortDirection, error_result, parse_params, success_result};
use super::query::{CasePolicy, QueryFilter, QuerySort, ReportArguments, assemble_query};

// ============================================================================
// Column vocabulary
// ============================================================================

/// Columns accepted by the revenue report endpoint.
pub const REVENUE_COLUMNS: [&str; 24] = [
    "day",
    "hour",
    "application",
    "package_name",
    "ad_format",
    "country",
    "platform",
    "network",
    "network_placement",
    "max_placement",
    "max_ad_unit_id",
    "custom_network_name",
    "ad_unit_waterfall_name",
    "device_type",
    "store_id",
    "has_idfa",
    "max_ad_unit_test",
    "impressions",
    "responses",
    "requests",
    "attempts",
    "estimated_revenue",
    "ecpm",
    "fill_rate",
];

/// Columns used when the caller does not ask for any.
pub const DEFAULT_REVENUE_COLUMNS: [&str; 2] = ["day", "application"];

fn default_revenue_columns() -> Vec<String> {
    DEFAULT_REVENUE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect()
}

fn revenue_columns_schema(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "array",
        "items": { "type": "string", "enum": REVENUE_COLUMNS },
        "default": DEFAULT_REVENUE_COLUMNS,
        "description": "Columns to include in the report. Use dimension columns to group data (day, hour, application, country, platform) and metric columns for performance data (impressions, responses, estimated_revenue, ecpm, fill_rate). Multiple dimensions and metrics can be combined in a single request."
    })
}

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the revenue report tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RevenueReportParams {
    /// Report range start, inclusive.
    #[schemars(description = "YYYY-MM-DD formatted starting date")]
    pub start: String,

    /// Report range end, inclusive.
    #[schemars(description = "YYYY-MM-DD formatted ending date")]
    pub end: String,

    #[schemars(
        description = "Response format: 'json' for structured data or 'csv' for comma-separated values"
    )]
    pub format: ReportFormat,

    #[serde(default = "default_revenue_columns")]
    #[schemars(schema_with = "revenue_columns_schema")]
    pub columns: Vec<String>,

    #[schemars(description = "Filter results to a specific application name")]
    pub filter_application: Option<String>,

    #[schemars(description = "Filter results to a specific app package name (e.g. 'com.example.app')")]
    pub filter_package_name: Option<String>,

    #[schemars(description = "Filter results to an ad type (e.g. banner, inter, rewarded)")]
    pub filter_ad_type: Option<String>,

    #[schemars(description = "Filter results to a country, two letter ISO code (e.g. 'US', 'JP')")]
    pub filter_country: Option<String>,

    #[schemars(description = "Filter results to a platform: 'android' or 'ios'")]
    pub filter_platform: Option<String>,

    #[schemars(description = "Filter results to a mediated network")]
    pub filter_network: Option<String>,

    #[schemars(description = "Filter results to a zone")]
    pub filter_zone: Option<String>,

    #[schemars(description = "Sort results by day, ascending (ASC) or descending (DESC)")]
    pub sort_day: Option<SortDirection>,

    #[schemars(description = "Sort results by hour, ascending (ASC) or descending (DESC)")]
    pub sort_hour: Option<SortDirection>,

    #[schemars(
        description = "Sort results by estimated revenue, ascending (ASC) or descending (DESC)"
    )]
    pub sort_estimated_revenue: Option<SortDirection>,

    #[schemars(description = "Limit the number of results returned (for pagination)")]
    pub limit: Option<f64>,

    #[schemars(description = "Skip the first N results (for pagination, use with limit)")]
    pub offset: Option<f64>,

    #[schemars(description = "When true, exclude rows where all metric values are zero")]
    pub not_zero: Option<bool>,
}

// ============================================================================
// Tool Implementation
// ============================================================================

/// Revenue report tool implementation.
#[derive(Debug, Clone)]
pub struct RevenueReportTool;

impl RevenueReportTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "revenue_report";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Request an aggregated mediation revenue report from the AppLovin MAX reporting API. \
         Returns impressions, requests, responses, fill rate, eCPM and estimated revenue \
         broken down by the requested dimension columns (day, hour, application, country, \
         network, ...). Dates use YYYY-MM-DD format; the report is relayed as raw JSON or CSV.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic. Blocking; run via `spawn_blocking`.
    pub fn execute(params: &RevenueReportParams, config: &Config) -> CallToolResult {
        info!(
            "Requesting MAX revenue report from {} to {}",
            params.start, params.end
        );

        let arguments = ReportArguments {
            start: &params.start,
            end: &params.end,
            format: params.format,
            columns: &params.columns,
            cohort_interval: None,
            expand_time_series: false,
            filters: vec![
                QueryFilter {
                    name: "application",
                    value: params.filter_application.as_deref(),
                    case: CasePolicy::Verbatim,
                },
                QueryFilter {
                    name: "package_name",
                    value: params.filter_package_name.as_deref(),
                    case: CasePolicy::Verbatim,
                },
                QueryFilter {
                    name: "ad_type",
                    value: params.filter_ad_type.as_deref(),
                    case: CasePolicy::Lowercase,
                },
                QueryFilter {
                    name: "country",
                    value: params.filter_country.as_deref(),
                    case: CasePolicy::Lowercase,
                },
                QueryFilter {
                    name: "platform",
                    value: params.filter_platform.as_deref(),
                    case: CasePolicy::Lowercase,
                },
                QueryFilter {
                    name: "network",
                    value: params.filter_network.as_deref(),
                    case: CasePolicy::Verbatim,
                },
                QueryFilter {
                    name: "zone",
                    value: params.filter_zone.as_deref(),
                    case: CasePolicy::Verbatim,
                },
            ],
            sorts: vec![
                QuerySort {
                    name: "day",
                    direction: params.sort_day,
                },
                QuerySort {
                    name: "hour",
                    direction: params.sort_hour,
                },
                QuerySort {
                    name: "estimated_revenue",
                    direction: params.sort_estimated_revenue,
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

        match client::fetch_report(&config.max_api.base_url, REVENUE_REPORT_PATH, &query) {
            Ok(body) => {
                info!("Revenue report fetched ({} bytes)", body.len());
                success_result(body)
            }
            Err(e) => {
                error!("Revenue report request failed: {}", e);
                error_result(&e.to_string())
            }
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<RevenueReportParams>(),
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
                let params: RevenueReportParams = match parse_params(args) {
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

impl Default for RevenueReportTool {
    fn default() -> Self {
        Self::new()
    }
}
