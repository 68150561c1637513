use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::VitalsError;

/// Patient identity as carried on the wire.
pub type PatientId = i32;

/// Kind of measurement carried by a record.
///
/// The external form is a bare string (`"BloodPressure"`, `"ecg"`, ...) and is
/// matched case-insensitively; anything outside this vocabulary is rejected
/// at the boundary instead of silently slipping past the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    BloodPressure,
    SystolicPressure,
    DiastolicPressure,
    Saturation,
    #[serde(rename = "ECG")]
    Ecg,
    HeartRate,
    Cholesterol,
    WhiteBloodCells,
    RedBloodCells,
    /// Manually raised alert (e.g. a nurse-call button).
    Alert,
}

impl RecordType {
    pub const ALL: [RecordType; 10] = [
        RecordType::BloodPressure,
        RecordType::SystolicPressure,
        RecordType::DiastolicPressure,
        RecordType::Saturation,
        RecordType::Ecg,
        RecordType::HeartRate,
        RecordType::Cholesterol,
        RecordType::WhiteBloodCells,
        RecordType::RedBloodCells,
        RecordType::Alert,
    ];

    /// Canonical external name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::BloodPressure => "BloodPressure",
            RecordType::SystolicPressure => "SystolicPressure",
            RecordType::DiastolicPressure => "DiastolicPressure",
            RecordType::Saturation => "Saturation",
            RecordType::Ecg => "ECG",
            RecordType::HeartRate => "HeartRate",
            RecordType::Cholesterol => "Cholesterol",
            RecordType::WhiteBloodCells => "WhiteBloodCells",
            RecordType::RedBloodCells => "RedBloodCells",
            RecordType::Alert => "Alert",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| VitalsError::UnknownRecordType(trimmed.to_string()))
    }
}

/// A single timestamped clinical reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    pub record_type: RecordType,
    pub value: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PatientRecord {
    pub fn new(patient_id: PatientId, value: f64, record_type: RecordType, timestamp: i64) -> Self {
        Self {
            patient_id,
            record_type,
            value,
            timestamp,
        }
    }
}

/// Clinical condition an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertCondition {
    #[serde(rename = "Blood Pressure Trend Alert")]
    BloodPressureTrend,
    #[serde(rename = "Critical Blood Pressure Alert")]
    CriticalBloodPressure,
    #[serde(rename = "Low Saturation Alert")]
    LowSaturation,
    #[serde(rename = "Rapid Saturation Drop Alert")]
    RapidSaturationDrop,
    #[serde(rename = "Hypotensive Hypoxemia Alert")]
    HypotensiveHypoxemia,
    #[serde(rename = "ECG Peak Alert")]
    EcgPeak,
    #[serde(rename = "Triggered Alert")]
    Triggered,
}

impl AlertCondition {
    /// Human-readable name used on the delivery contract
    pub fn label(&self) -> &'static str {
        match self {
            AlertCondition::BloodPressureTrend => "Blood Pressure Trend Alert",
            AlertCondition::CriticalBloodPressure => "Critical Blood Pressure Alert",
            AlertCondition::LowSaturation => "Low Saturation Alert",
            AlertCondition::RapidSaturationDrop => "Rapid Saturation Drop Alert",
            AlertCondition::HypotensiveHypoxemia => "Hypotensive Hypoxemia Alert",
            AlertCondition::EcgPeak => "ECG Peak Alert",
            AlertCondition::Triggered => "Triggered Alert",
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert raised by a detection rule.
///
/// `timestamp` is when the rule judges the condition to have occurred, not
/// when the alert was built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alert {
    /// Serialized as a string, the form downstream consumers key on
    #[serde(with = "patient_id_string")]
    pub patient_id: PatientId,
    pub condition: AlertCondition,
    pub timestamp: i64,
}

impl Alert {
    pub fn new(patient_id: PatientId, condition: AlertCondition, timestamp: i64) -> Self {
        Self {
            patient_id,
            condition,
            timestamp,
        }
    }

    /// Wall-clock time of the alert, if the timestamp is representable
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

mod patient_id_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::PatientId;

    pub fn serialize<S: Serializer>(id: &PatientId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PatientId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid patient id: {}", raw)))
    }
}
