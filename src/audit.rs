//! Audit log — a line-delimited JSON event stream on stdout, distinct from
//! the human-readable `tracing` log.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct AuditEvent<'a> {
    timestamp: String,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Emit one audit line. Never fails the caller — a serialization error is
/// logged via `tracing` instead of propagated.
pub fn log_event(event: &str, instance_id: Option<&str>, details: Option<Value>) {
    let record = AuditEvent {
        timestamp: Utc::now().to_rfc3339(),
        event,
        instance_id,
        details,
    };
    match serde_json::to_string(&record) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize audit event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_minimal_event() {
        let record = AuditEvent {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            event: "reconcile",
            instance_id: None,
            details: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"event\":\"reconcile\""));
        assert!(!json.contains("instance_id"));
    }
}
