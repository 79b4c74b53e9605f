//! Query assembly for the MAX reporting API.
//!
//! Both reporting tools reduce their parameters to a [`ReportArguments`]
//! view, and [`assemble_query`] turns that view into the ordered `key=value`
//! pairs the API expects. Cohort time-series metrics are expanded here into
//! one column per tracked day.

use thiserror::Error;

use super::common::{ReportFormat, SortDirection};

/// Day offsets the cohort endpoints accept for `cohort_interval`.
pub const COHORT_INTERVALS: [i64; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 10, 14, 18, 21, 24, 27, 30, 45];

/// Suffixes that mark a cohort column as a time-series metric.
const TIME_SERIES_SUFFIXES: [&str; 3] = ["_rpi", "_imp", "_retention"];

/// Cohort columns that are time-series metrics without a matching suffix.
const TIME_SERIES_COLUMNS: [&str; 4] = ["pub_revenue", "sessions", "session_length", "daily_usage"];

/// Errors produced while turning tool arguments into query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No API key is available for the request.
    #[error("api_key not configured: set the APPLOVIN_API_KEY environment variable")]
    MissingApiKey,

    /// The caller sent an explicitly empty column list.
    #[error("columns required")]
    ColumnsRequired,

    /// A time-series column was requested without a `cohort_interval`.
    #[error("cohort_interval required when using time-based metric: {column}")]
    IntervalRequired { column: String },

    /// The `cohort_interval` value is not an integer.
    #[error("cohort_interval string couldn't be parsed to int")]
    IntervalNotInteger,

    /// The `cohort_interval` value is an integer outside the accepted set.
    #[error("invalid cohort_interval: {0}")]
    IntervalNotAllowed(String),
}

/// How a filter value is normalized before it is placed in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePolicy {
    /// Controlled vocabulary (country codes, platforms, ad types).
    Lowercase,
    /// Free text (application names, package names) that must keep its case
    /// to match what the dashboard shows.
    Verbatim,
}

/// One `filter_*` argument and how to encode it.
#[derive(Debug, Clone)]
pub struct QueryFilter<'a> {
    pub name: &'static str,
    pub value: Option<&'a str>,
    pub case: CasePolicy,
}

/// One `sort_*` argument.
#[derive(Debug, Clone)]
pub struct QuerySort {
    pub name: &'static str,
    pub direction: Option<SortDirection>,
}

/// Tool-agnostic view of a report request.
///
/// Each tool builds one of these from its own parameter struct; the filter
/// and sort tables differ per tool but the assembly rules are shared.
#[derive(Debug, Clone)]
pub struct ReportArguments<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub format: ReportFormat,
    pub columns: &'a [String],
    /// Day offset for time-series expansion, as provided by the caller.
    pub cohort_interval: Option<&'a str>,
    /// Whether time-series metrics in `columns` expand into per-day columns.
    /// Only the cohort endpoints understand the expanded form.
    pub expand_time_series: bool,
    pub filters: Vec<QueryFilter<'a>>,
    pub sorts: Vec<QuerySort>,
    pub limit: Option<f64>,
    pub offset: Option<f64>,
    pub not_zero: Option<bool>,
}

/// Check whether a cohort column is a time-series metric.
///
/// Time-series metrics produce one value per tracked day and must be expanded
/// with a `cohort_interval` before they are sent upstream. Plain dimensions
/// (`day`, `installs`, `country`, ...) and the bare `imp`/`retention` tokens
/// are not time-series.
pub fn is_time_series_column(column: &str) -> bool {
    TIME_SERIES_SUFFIXES
        .iter()
        .any(|suffix| column.ends_with(suffix))
        || column.contains("_per_user")
        || TIME_SERIES_COLUMNS.contains(&column)
}

/// Expand time-series metrics into per-day columns.
///
/// A time-series column `x` with interval `k` becomes `x_0, x_1, ..., x_k`
/// (inclusive, `k + 1` columns) in place; other columns pass through
/// unchanged. The interval is only validated once a time-series column is
/// actually present.
pub fn expand_time_series_columns(
    columns: &[String],
    cohort_interval: Option<&str>,
) -> Result<Vec<String>, QueryError> {
    let mut expanded = Vec::with_capacity(columns.len());

    for column in columns {
        if !is_time_series_column(column) {
            expanded.push(column.clone());
            continue;
        }

        let interval = cohort_interval.ok_or_else(|| QueryError::IntervalRequired {
            column: column.clone(),
        })?;

        let days = interval
            .parse::<i64>()
            .map_err(|_| QueryError::IntervalNotInteger)?;

        if !COHORT_INTERVALS.contains(&days) {
            return Err(QueryError::IntervalNotAllowed(interval.to_string()));
        }

        for day in 0..=days {
            expanded.push(format!("{}_{}", column, day));
        }
    }

    Ok(expanded)
}

/// Assemble the ordered query parameters for a report request.
///
/// The pair order is fixed (api_key, required fields, filters, sorts,
/// pagination, not_zero) so identical arguments always produce an identical
/// query string.
pub fn assemble_query(
    args: &ReportArguments<'_>,
    api_key: Option<&str>,
) -> Result<Vec<(String, String)>, QueryError> {
    let api_key = api_key
        .filter(|key| !key.is_empty())
        .ok_or(QueryError::MissingApiKey)?;

    if args.columns.is_empty() {
        return Err(QueryError::ColumnsRequired);
    }

    let columns = if args.expand_time_series {
        expand_time_series_columns(args.columns, args.cohort_interval)?
    } else {
        args.columns.to_vec()
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    pairs.push(("api_key".to_string(), api_key.to_string()));
    pairs.push(("start".to_string(), args.start.to_lowercase()));
    pairs.push(("end".to_string(), args.end.to_lowercase()));
    pairs.push((
        "format".to_string(),
        args.format.as_query_value().to_string(),
    ));
    pairs.push(("columns".to_string(), columns.join(",").to_lowercase()));

    for filter in &args.filters {
        if let Some(value) = filter.value {
            let value = match filter.case {
                CasePolicy::Lowercase => value.to_lowercase(),
                CasePolicy::Verbatim => value.to_string(),
            };
            pairs.push((format!("filter_{}", filter.name), value));
        }
    }

    for sort in &args.sorts {
        if let Some(direction) = sort.direction {
            pairs.push((
                format!("sort_{}", sort.name),
                direction.as_query_value().to_string(),
            ));
        }
    }

    if let Some(limit) = args.limit {
        pairs.push(("limit".to_string(), (limit as i64).to_string()));
    }

    if let Some(offset) = args.offset {
        pairs.push(("offset".to_string(), (offset as i64).to_string()));
    }

    if args.not_zero == Some(true) {
        pairs.push(("not_zero".to_string(), "1".to_string()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn base_arguments<'a>(cols: &'a [String]) -> ReportArguments<'a> {
        ReportArguments {
            start: "2024-01-01",
            end: "2024-01-31",
            format: ReportFormat::Json,
            columns: cols,
            cohort_interval: None,
            expand_time_series: false,
            filters: vec![],
            sorts: vec![],
            limit: None,
            offset: None,
            not_zero: None,
        }
    }

    fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_time_series_detection() {
        assert!(is_time_series_column("ads_rpi"));
        assert!(is_time_series_column("iap_rpi"));
        assert!(is_time_series_column("banner_imp"));
        assert!(is_time_series_column("reward_imp"));
        assert!(is_time_series_column("imp_per_user"));
        assert!(is_time_series_column("pub_revenue"));
        assert!(is_time_series_column("sessions"));
        assert!(is_time_series_column("session_length"));
        assert!(is_time_series_column("daily_usage"));
    }

    #[test]
    fn test_plain_dimensions_are_not_time_series() {
        assert!(!is_time_series_column("day"));
        assert!(!is_time_series_column("installs"));
        assert!(!is_time_series_column("country"));
        assert!(!is_time_series_column("platform"));
        assert!(!is_time_series_column("package_name"));
        assert!(!is_time_series_column("application"));
        // Only the suffixed forms are per-day metrics.
        assert!(!is_time_series_column("imp"));
        assert!(!is_time_series_column("retention"));
    }

    #[test]
    fn test_expansion_is_inclusive_and_ordered() {
        let cols = columns(&["ads_rpi"]);
        let expanded = expand_time_series_columns(&cols, Some("3")).unwrap();
        assert_eq!(expanded, vec!["ads_rpi_0", "ads_rpi_1", "ads_rpi_2", "ads_rpi_3"]);
    }

    #[test]
    fn test_expansion_interval_zero_gives_single_day() {
        let cols = columns(&["imp_per_user"]);
        let expanded = expand_time_series_columns(&cols, Some("0")).unwrap();
        assert_eq!(expanded, vec!["imp_per_user_0"]);
    }

    #[test]
    fn test_expansion_preserves_surrounding_columns() {
        let cols = columns(&["day", "ads_rpi", "installs"]);
        let expanded = expand_time_series_columns(&cols, Some("1")).unwrap();
        assert_eq!(expanded, vec!["day", "ads_rpi_0", "ads_rpi_1", "installs"]);
    }

    #[test]
    fn test_expansion_requires_interval_and_names_column() {
        let cols = columns(&["day", "reward_imp"]);
        let err = expand_time_series_columns(&cols, None).unwrap_err();
        assert_eq!(
            err,
            QueryError::IntervalRequired {
                column: "reward_imp".to_string()
            }
        );
        assert!(err.to_string().contains("reward_imp"));
    }

    #[test]
    fn test_expansion_rejects_non_integer_interval() {
        let cols = columns(&["ads_rpi"]);
        let err = expand_time_series_columns(&cols, Some("abc")).unwrap_err();
        assert_eq!(err, QueryError::IntervalNotInteger);
    }

    #[test]
    fn test_expansion_rejects_interval_outside_set() {
        let cols = columns(&["ads_rpi"]);
        let err = expand_time_series_columns(&cols, Some("9")).unwrap_err();
        assert_eq!(err, QueryError::IntervalNotAllowed("9".to_string()));
    }

    #[test]
    fn test_expansion_rejects_digit_substring_of_member() {
        // "8" is a substring of the allowed "18" but is not itself allowed.
        let cols = columns(&["ads_rpi"]);
        let err = expand_time_series_columns(&cols, Some("8")).unwrap_err();
        assert_eq!(err, QueryError::IntervalNotAllowed("8".to_string()));
    }

    #[test]
    fn test_expansion_rejects_negative_interval() {
        let cols = columns(&["ads_rpi"]);
        let err = expand_time_series_columns(&cols, Some("-1")).unwrap_err();
        assert_eq!(err, QueryError::IntervalNotAllowed("-1".to_string()));
    }

    #[test]
    fn test_expansion_accepts_largest_interval() {
        let cols = columns(&["ads_rpi"]);
        let expanded = expand_time_series_columns(&cols, Some("45")).unwrap();
        assert_eq!(expanded.len(), 46);
        assert_eq!(expanded[0], "ads_rpi_0");
        assert_eq!(expanded[45], "ads_rpi_45");
    }

    #[test]
    fn test_interval_ignored_without_time_series_columns() {
        let cols = columns(&["day", "installs"]);
        let expanded = expand_time_series_columns(&cols, Some("abc")).unwrap();
        assert_eq!(expanded, vec!["day", "installs"]);
    }

    #[test]
    fn test_assemble_pair_order() {
        let cols = columns(&["day", "application"]);
        let mut args = base_arguments(&cols);
        args.filters = vec![QueryFilter {
            name: "country",
            value: Some("US"),
            case: CasePolicy::Lowercase,
        }];
        args.sorts = vec![QuerySort {
            name: "day",
            direction: Some(SortDirection::Desc),
        }];
        args.limit = Some(10.0);
        args.offset = Some(5.0);
        args.not_zero = Some(true);

        let pairs = assemble_query(&args, Some("secret")).unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "api_key",
                "start",
                "end",
                "format",
                "columns",
                "filter_country",
                "sort_day",
                "limit",
                "offset",
                "not_zero"
            ]
        );
    }

    #[test]
    fn test_assemble_required_values() {
        let cols = columns(&["Day", "Application"]);
        let args = base_arguments(&cols);
        let pairs = assemble_query(&args, Some("secret")).unwrap();

        assert_eq!(value_of(&pairs, "api_key"), Some("secret"));
        assert_eq!(value_of(&pairs, "start"), Some("2024-01-01"));
        assert_eq!(value_of(&pairs, "end"), Some("2024-01-31"));
        assert_eq!(value_of(&pairs, "format"), Some("json"));
        assert_eq!(value_of(&pairs, "columns"), Some("day,application"));
    }

    #[test]
    fn test_assemble_missing_api_key() {
        let cols = columns(&["day"]);
        let args = base_arguments(&cols);
        assert_eq!(
            assemble_query(&args, None).unwrap_err(),
            QueryError::MissingApiKey
        );
        assert_eq!(
            assemble_query(&args, Some("")).unwrap_err(),
            QueryError::MissingApiKey
        );
    }

    #[test]
    fn test_assemble_empty_columns() {
        let cols: Vec<String> = vec![];
        let args = base_arguments(&cols);
        assert_eq!(
            assemble_query(&args, Some("secret")).unwrap_err(),
            QueryError::ColumnsRequired
        );
    }

    #[test]
    fn test_assemble_case_policies() {
        let cols = columns(&["day"]);
        let mut args = base_arguments(&cols);
        args.filters = vec![
            QueryFilter {
                name: "country",
                value: Some("US"),
                case: CasePolicy::Lowercase,
            },
            QueryFilter {
                name: "application",
                value: Some("My Cool Game"),
                case: CasePolicy::Verbatim,
            },
            QueryFilter {
                name: "platform",
                value: None,
                case: CasePolicy::Lowercase,
            },
        ];

        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "filter_country"), Some("us"));
        assert_eq!(value_of(&pairs, "filter_application"), Some("My Cool Game"));
        assert_eq!(value_of(&pairs, "filter_platform"), None);
    }

    #[test]
    fn test_assemble_truncates_pagination() {
        let cols = columns(&["day"]);
        let mut args = base_arguments(&cols);
        args.limit = Some(100.9);
        args.offset = Some(0.0);

        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "limit"), Some("100"));
        assert_eq!(value_of(&pairs, "offset"), Some("0"));
    }

    #[test]
    fn test_assemble_not_zero_only_when_true() {
        let cols = columns(&["day"]);

        let mut args = base_arguments(&cols);
        args.not_zero = Some(true);
        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "not_zero"), Some("1"));

        args.not_zero = Some(false);
        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "not_zero"), None);

        args.not_zero = None;
        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "not_zero"), None);
    }

    #[test]
    fn test_assemble_expands_only_when_requested() {
        let cols = columns(&["ads_rpi"]);

        let mut args = base_arguments(&cols);
        args.expand_time_series = true;
        args.cohort_interval = Some("2");
        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(
            value_of(&pairs, "columns"),
            Some("ads_rpi_0,ads_rpi_1,ads_rpi_2")
        );

        // The revenue endpoint never expands, even for a matching name.
        args.expand_time_series = false;
        let pairs = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(value_of(&pairs, "columns"), Some("ads_rpi"));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let cols = columns(&["day", "imp_per_user"]);
        let mut args = base_arguments(&cols);
        args.expand_time_series = true;
        args.cohort_interval = Some("7");
        args.not_zero = Some(true);

        let first = assemble_query(&args, Some("secret")).unwrap();
        let second = assemble_query(&args, Some("secret")).unwrap();
        assert_eq!(first, second);
    }
}
