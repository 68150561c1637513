//! Renderings of an alert for the different delivery channels.

use chrono::SecondsFormat;
use vitals_core::Alert;

/// `ALERT: Patient 3 - Low Saturation Alert at 1000`
pub fn console_line(alert: &Alert) -> String {
    format!(
        "ALERT: Patient {} - {} at {}",
        alert.patient_id, alert.condition, alert.timestamp
    )
}

/// `3,Low Saturation Alert,1000`
pub fn csv_line(alert: &Alert) -> String {
    format!("{},{},{}", alert.patient_id, alert.condition, alert.timestamp)
}

/// Webhook body. `occurred_at` is null when the timestamp is out of range.
pub fn json_payload(alert: &Alert) -> serde_json::Value {
    let occurred_at = alert
        .occurred_at()
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));

    serde_json::json!({
        "patient_id": alert.patient_id.to_string(),
        "condition": alert.condition.label(),
        "timestamp": alert.timestamp,
        "occurred_at": occurred_at,
    })
}
