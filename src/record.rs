use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::policy::LogFormat;

/// Context attached to every emitted log line.
///
/// Optional attributes are skipped when absent, never serialized as null.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: &'static str,
    pub service: String,
    pub environment: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Logger name; rendered in text formats only.
    #[serde(skip)]
    pub logger: String,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

/// RFC 3339 UTC with millisecond precision, e.g. `2024-05-01T09:30:00.125Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl LogRecord {
    /// Render this record as a single line (without trailing newline) in
    /// the given format.
    pub fn render(&self, format: LogFormat) -> Result<String, serde_json::Error> {
        let mut line = match format {
            LogFormat::Structured => return serde_json::to_string(self),
            LogFormat::Human => format!(
                "{} - {} - {} - [{}:{}] - {}",
                format_timestamp(&self.timestamp),
                self.logger,
                self.level,
                self.service,
                self.environment,
                self.message
            ),
            LogFormat::Plain => format!(
                "{} - {} - {} - {}",
                format_timestamp(&self.timestamp),
                self.logger,
                self.level,
                self.message
            ),
        };
        if let Some(exception) = &self.exception {
            line.push('\n');
            line.push_str(exception);
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            level: "INFO",
            service: "healthmate-core".to_string(),
            environment: "staging".to_string(),
            message: "user pool ready".to_string(),
            exception: None,
            user_id: None,
            request_id: None,
            logger: "stack".to_string(),
        }
    }

    #[test]
    fn structured_omits_absent_fields() {
        let line = record().render(LogFormat::Structured).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 5);
        assert_eq!(obj["timestamp"], "2024-05-01T09:30:00.000Z");
        assert_eq!(obj["level"], "INFO");
        assert_eq!(obj["service"], "healthmate-core");
        assert_eq!(obj["environment"], "staging");
        assert_eq!(obj["message"], "user pool ready");
        assert!(!line.contains("null"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn structured_includes_correlation_when_present() {
        let mut rec = record();
        rec.user_id = Some("42".to_string());
        rec.request_id = Some("req-7".to_string());
        rec.exception = Some("Traceback: boom".to_string());

        let value: serde_json::Value =
            serde_json::from_str(&rec.render(LogFormat::Structured).unwrap()).unwrap();
        assert_eq!(value["user_id"], "42");
        assert_eq!(value["request_id"], "req-7");
        assert_eq!(value["exception"], "Traceback: boom");
    }

    #[test]
    fn human_line_carries_service_and_environment() {
        let line = record().render(LogFormat::Human).unwrap();
        assert_eq!(
            line,
            "2024-05-01T09:30:00.000Z - stack - INFO - [healthmate-core:staging] - user pool ready"
        );
    }

    #[test]
    fn plain_line_has_no_context_tag() {
        let line = record().render(LogFormat::Plain).unwrap();
        assert_eq!(line, "2024-05-01T09:30:00.000Z - stack - INFO - user pool ready");
    }

    #[test]
    fn text_formats_append_exception() {
        let mut rec = record();
        rec.exception = Some("boom".to_string());
        assert!(rec.render(LogFormat::Plain).unwrap().ends_with("user pool ready\nboom"));
    }
}
