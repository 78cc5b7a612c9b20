/// Returns time now in RFC-3339 profile of ISO 8601 format with
/// microsecond precision in UTC.
pub fn nowiso8601() -> String {
    use chrono::{SecondsFormat, Utc};

    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
