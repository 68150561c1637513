//! Clinical detection rules.
//!
//! Each rule is a pure function over timestamp-sorted readings of a single
//! type that lazily yields the alerts it detects. Rules never deduplicate:
//! overlapping windows and pairwise scans may report the same episode more
//! than once.

use std::fmt;

use vitals_core::{Alert, AlertCondition, PatientId, PatientRecord};

use crate::RecordPartition;

/// Thresholds shared by the rule battery
#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Minimum mmHg change between consecutive readings of a trend
    pub trend_step: f64,
    pub critical_bp_high: f64,
    pub critical_bp_low: f64,
    /// Saturation percentage below which a reading is low
    pub low_saturation: f64,
    /// Minimum saturation drop (percentage points) for the rapid-drop rule
    pub rapid_drop: f64,
    pub rapid_drop_window_ms: u64,
    pub hypotension_bp: f64,
    pub hypoxemia_saturation: f64,
    /// Readings must be strictly closer than this to be paired
    pub hypoxemia_window_ms: u64,
    /// Number of preceding ECG readings averaged for peak detection
    pub ecg_window: usize,
    pub ecg_peak_factor: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            trend_step: 10.0,
            critical_bp_high: 120.0,
            critical_bp_low: 90.0,
            low_saturation: 92.0,
            rapid_drop: 5.0,
            rapid_drop_window_ms: 10 * 60 * 1000,
            hypotension_bp: 90.0,
            hypoxemia_saturation: 92.0,
            hypoxemia_window_ms: 5 * 60 * 1000,
            ecg_window: 5,
            ecg_peak_factor: 1.5,
        }
    }
}

/// Three consecutive blood-pressure readings that each rise, or each fall,
/// by more than `trend_step`. Fires at the third reading.
pub fn blood_pressure_trend<'a>(
    patient_id: PatientId,
    readings: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    let step = thresholds.trend_step;
    readings
        .windows(3)
        .filter(move |w| {
            let (a, b, c) = (w[0].value, w[1].value, w[2].value);
            (b - a > step && c - b > step) || (a - b > step && b - c > step)
        })
        .map(move |w| Alert::new(patient_id, AlertCondition::BloodPressureTrend, w[2].timestamp))
}

/// Any single blood-pressure reading outside `[critical_bp_low, critical_bp_high]`.
pub fn critical_blood_pressure<'a>(
    patient_id: PatientId,
    readings: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    readings
        .iter()
        .filter(move |r| r.value > thresholds.critical_bp_high || r.value < thresholds.critical_bp_low)
        .map(move |r| Alert::new(patient_id, AlertCondition::CriticalBloodPressure, r.timestamp))
}

pub fn low_saturation<'a>(
    patient_id: PatientId,
    readings: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    readings
        .iter()
        .filter(move |r| r.value < thresholds.low_saturation)
        .map(move |r| Alert::new(patient_id, AlertCondition::LowSaturation, r.timestamp))
}

/// Every earlier/later pair of saturation readings at most
/// `rapid_drop_window_ms` apart whose value fell by at least `rapid_drop`.
/// Fires at the later reading; quadratic in the number of readings.
pub fn rapid_saturation_drop<'a>(
    patient_id: PatientId,
    readings: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    readings.iter().enumerate().flat_map(move |(i, earlier)| {
        readings[i + 1..]
            .iter()
            .filter(move |later| {
                later.timestamp.abs_diff(earlier.timestamp) <= thresholds.rapid_drop_window_ms
                    && earlier.value - later.value >= thresholds.rapid_drop
            })
            .map(move |later| {
                Alert::new(patient_id, AlertCondition::RapidSaturationDrop, later.timestamp)
            })
    })
}

/// Every (blood pressure, saturation) pair closer than
/// `hypoxemia_window_ms` where both readings are low. Fires at the later of
/// the two timestamps.
pub fn hypotensive_hypoxemia<'a>(
    patient_id: PatientId,
    blood_pressure: &'a [PatientRecord],
    saturation: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    blood_pressure
        .iter()
        .filter(move |bp| bp.value < thresholds.hypotension_bp)
        .flat_map(move |bp| {
            saturation
                .iter()
                .filter(move |sat| {
                    bp.timestamp.abs_diff(sat.timestamp) < thresholds.hypoxemia_window_ms
                        && sat.value < thresholds.hypoxemia_saturation
                })
                .map(move |sat| {
                    Alert::new(
                        patient_id,
                        AlertCondition::HypotensiveHypoxemia,
                        bp.timestamp.max(sat.timestamp),
                    )
                })
        })
}

/// ECG readings exceeding `ecg_peak_factor` times the mean of the
/// `ecg_window` readings before them. The window slides on after a hit.
pub fn ecg_peak<'a>(
    patient_id: PatientId,
    readings: &'a [PatientRecord],
    thresholds: &'a RuleThresholds,
) -> impl Iterator<Item = Alert> + 'a {
    let window = thresholds.ecg_window;
    readings
        .windows(window.saturating_add(1))
        .filter(move |w| {
            let (history, current) = w.split_at(window);
            let mean = history.iter().map(|r| r.value).sum::<f64>() / window as f64;
            current[0].value > mean * thresholds.ecg_peak_factor
        })
        .map(move |w| Alert::new(patient_id, AlertCondition::EcgPeak, w[window].timestamp))
}

/// Manually raised alerts pass straight through.
pub fn triggered_alert(
    patient_id: PatientId,
    records: &[PatientRecord],
) -> impl Iterator<Item = Alert> + '_ {
    records
        .iter()
        .map(move |r| Alert::new(patient_id, AlertCondition::Triggered, r.timestamp))
}

/// The rule battery, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    BloodPressureTrend,
    CriticalBloodPressure,
    LowSaturation,
    RapidSaturationDrop,
    HypotensiveHypoxemia,
    EcgPeak,
    Triggered,
}

impl Rule {
    pub const ALL: [Rule; 7] = [
        Rule::BloodPressureTrend,
        Rule::CriticalBloodPressure,
        Rule::LowSaturation,
        Rule::RapidSaturationDrop,
        Rule::HypotensiveHypoxemia,
        Rule::EcgPeak,
        Rule::Triggered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::BloodPressureTrend => "blood_pressure_trend",
            Rule::CriticalBloodPressure => "critical_blood_pressure",
            Rule::LowSaturation => "low_saturation",
            Rule::RapidSaturationDrop => "rapid_saturation_drop",
            Rule::HypotensiveHypoxemia => "hypotensive_hypoxemia",
            Rule::EcgPeak => "ecg_peak",
            Rule::Triggered => "triggered_alert",
        }
    }

    /// Condition every alert from this rule carries
    pub fn condition(&self) -> AlertCondition {
        match self {
            Rule::BloodPressureTrend => AlertCondition::BloodPressureTrend,
            Rule::CriticalBloodPressure => AlertCondition::CriticalBloodPressure,
            Rule::LowSaturation => AlertCondition::LowSaturation,
            Rule::RapidSaturationDrop => AlertCondition::RapidSaturationDrop,
            Rule::HypotensiveHypoxemia => AlertCondition::HypotensiveHypoxemia,
            Rule::EcgPeak => AlertCondition::EcgPeak,
            Rule::Triggered => AlertCondition::Triggered,
        }
    }

    pub fn alerts<'a>(
        &self,
        patient_id: PatientId,
        records: &'a RecordPartition,
        thresholds: &'a RuleThresholds,
    ) -> Box<dyn Iterator<Item = Alert> + 'a> {
        match self {
            Rule::BloodPressureTrend => Box::new(blood_pressure_trend(
                patient_id,
                &records.blood_pressure,
                thresholds,
            )),
            Rule::CriticalBloodPressure => Box::new(critical_blood_pressure(
                patient_id,
                &records.blood_pressure,
                thresholds,
            )),
            Rule::LowSaturation => {
                Box::new(low_saturation(patient_id, &records.saturation, thresholds))
            }
            Rule::RapidSaturationDrop => Box::new(rapid_saturation_drop(
                patient_id,
                &records.saturation,
                thresholds,
            )),
            Rule::HypotensiveHypoxemia => Box::new(hypotensive_hypoxemia(
                patient_id,
                &records.blood_pressure,
                &records.saturation,
                thresholds,
            )),
            Rule::EcgPeak => Box::new(ecg_peak(patient_id, &records.ecg, thresholds)),
            Rule::Triggered => Box::new(triggered_alert(patient_id, &records.manual)),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
