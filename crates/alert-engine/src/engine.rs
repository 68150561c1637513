use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use data_storage::{DataStorage, Patient};
use rayon::prelude::*;
use vitals_core::{Alert, AlertSink, PatientId};

use crate::{RecordPartition, Rule, RuleThresholds};

/// Outcome of evaluating one patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationReport {
    pub patient_id: PatientId,
    pub alerts_emitted: usize,
    /// Alerts delivered by each rule, in rule order
    pub alerts_per_rule: Vec<(Rule, usize)>,
    /// Rules that panicked; alerts they delivered before failing still count
    pub failed_rules: Vec<Rule>,
}

impl EvaluationReport {
    pub fn is_clean(&self) -> bool {
        self.failed_rules.is_empty()
    }
}

/// Runs the rule battery over patient histories and pushes alerts to a sink.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    thresholds: RuleThresholds,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Evaluate one patient snapshot.
    ///
    /// Rules run in [`Rule::ALL`] order. A panic inside a rule, or inside the
    /// sink while it is receiving that rule's alerts, is contained to that
    /// rule and the rest of the battery still runs.
    pub fn evaluate(&self, patient: &Patient, sink: &dyn AlertSink) -> EvaluationReport {
        let patient_id = patient.patient_id();
        let partition = RecordPartition::from_records(patient.all_records());

        let mut report = EvaluationReport {
            patient_id,
            alerts_emitted: 0,
            alerts_per_rule: Vec::with_capacity(Rule::ALL.len()),
            failed_rules: Vec::new(),
        };

        for rule in Rule::ALL {
            let mut emitted = 0usize;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                for alert in rule.alerts(patient_id, &partition, &self.thresholds) {
                    sink.deliver(alert);
                    emitted += 1;
                }
            }));

            if outcome.is_err() {
                tracing::error!(
                    "Rule {} failed for patient {} after {} alert(s); continuing",
                    rule,
                    patient_id,
                    emitted
                );
                report.failed_rules.push(rule);
            }
            report.alerts_emitted += emitted;
            report.alerts_per_rule.push((rule, emitted));
        }

        tracing::debug!(
            "Evaluated patient {} ({} records): {} alert(s)",
            patient_id,
            patient.len(),
            report.alerts_emitted
        );
        report
    }

    /// Evaluate one patient and return the alerts in emission order.
    pub fn collect(&self, patient: &Patient) -> Vec<Alert> {
        let sink = CollectingSink::default();
        self.evaluate(patient, &sink);
        sink.into_alerts()
    }

    /// Evaluate a single tracked patient; `None` if the id is unknown.
    pub fn evaluate_patient_id(
        &self,
        storage: &DataStorage,
        patient_id: PatientId,
        sink: &dyn AlertSink,
    ) -> Option<EvaluationReport> {
        storage
            .get_patient(patient_id)
            .map(|patient| self.evaluate(&patient, sink))
    }

    /// Evaluate every tracked patient in parallel.
    ///
    /// Each worker owns its patient's snapshot. Alerts of one patient arrive
    /// in rule order, but alerts of different patients may interleave.
    /// Reports come back ordered by patient id.
    pub fn evaluate_storage(
        &self,
        storage: &DataStorage,
        sink: &dyn AlertSink,
    ) -> Vec<EvaluationReport> {
        let patients = storage.patients();
        let reports: Vec<EvaluationReport> = patients
            .par_iter()
            .map(|patient| self.evaluate(patient, sink))
            .collect();

        let alerts: usize = reports.iter().map(|r| r.alerts_emitted).sum();
        let failures = reports.iter().filter(|r| !r.is_clean()).count();
        tracing::info!(
            "Evaluated {} patient(s): {} alert(s), {} with rule failures",
            reports.len(),
            alerts,
            failures
        );
        reports
    }
}

#[derive(Default)]
struct CollectingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingSink {
    fn into_alerts(self) -> Vec<Alert> {
        self.alerts
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlertSink for CollectingSink {
    fn deliver(&self, alert: Alert) {
        self.alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(alert);
    }
}
