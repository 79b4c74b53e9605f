//! Common types and helpers shared across the MAX reporting tools.
//!
//! Both tools accept the same `format` and `sort_*` vocabularies and return
//! results through the same success/error helpers.

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::warn;

/// Response format accepted by every MAX reporting endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    /// Value placed in the `format` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Sort direction for the `sort_*` arguments.
///
/// Tool arguments use the uppercase `ASC`/`DESC` spelling; the reporting API
/// expects the lowercase form in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Value placed in a `sort_*` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result with text content.
pub fn success_result(content: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(content)])
}

/// Deserialize a tool's raw argument object into its params struct.
///
/// A failure becomes the tool's error result, so the caller is told which
/// argument was rejected instead of receiving a protocol-level fault.
pub fn parse_params<T: DeserializeOwned>(
    args: serde_json::Map<String, serde_json::Value>,
) -> Result<T, CallToolResult> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| error_result(&format!("invalid arguments: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_deserializes_lowercase() {
        let format: ReportFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, ReportFormat::Json);
        let format: ReportFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(format, ReportFormat::Csv);
    }

    #[test]
    fn test_report_format_rejects_unknown() {
        assert!(serde_json::from_str::<ReportFormat>("\"xml\"").is_err());
        assert!(serde_json::from_str::<ReportFormat>("\"JSON\"").is_err());
    }

    #[test]
    fn test_sort_direction_uppercase_in_uppercase_out_lowercase() {
        let direction: SortDirection = serde_json::from_str("\"ASC\"").unwrap();
        assert_eq!(direction.as_query_value(), "asc");
        let direction: SortDirection = serde_json::from_str("\"DESC\"").unwrap();
        assert_eq!(direction.as_query_value(), "desc");
    }

    #[test]
    fn test_sort_direction_rejects_lowercase() {
        assert!(serde_json::from_str::<SortDirection>("\"asc\"").is_err());
    }

    #[test]
    fn test_error_result_flags_error() {
        let result = error_result("something went wrong");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_success_result_not_flagged() {
        let result = success_result("payload".to_string());
        assert_ne!(result.is_error, Some(true));
    }

    #[derive(Debug, Deserialize)]
    struct EchoParams {
        message: String,
    }

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_params_accepts_valid_object() {
        let params: EchoParams =
            parse_params(object(serde_json::json!({"message": "hello"}))).unwrap();
        assert_eq!(params.message, "hello");
    }

    #[test]
    fn test_parse_params_failure_becomes_error_result() {
        let result = parse_params::<EchoParams>(object(serde_json::json!({}))).unwrap_err();
        assert_eq!(result.is_error, Some(true));

        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            other => panic!("expected text content, got {:?}", other),
        };
        assert!(text.starts_with("invalid arguments:"));
        assert!(text.contains("missing field"));
        assert!(text.contains("message"));
    }
}
