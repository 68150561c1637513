use dashmap::DashMap;
use vitals_core::{PatientId, PatientRecord, RecordType, VitalsError};

use crate::Patient;

/// Concurrent store of every tracked patient's measurements.
///
/// Appends to different patients never contend on the same shard lock for
/// long, and reads hand back owned snapshots, so evaluators can work on a
/// patient while new data keeps arriving.
#[derive(Debug, Default)]
pub struct DataStorage {
    patients: DashMap<PatientId, Patient>,
}

impl DataStorage {
    pub fn new() -> Self {
        Self {
            patients: DashMap::new(),
        }
    }

    /// Append a reading, creating the patient on first sight.
    pub fn add_record(
        &self,
        patient_id: PatientId,
        value: f64,
        record_type: RecordType,
        timestamp: i64,
    ) {
        self.patients
            .entry(patient_id)
            .or_insert_with(|| Patient::new(patient_id))
            .add_record(value, record_type, timestamp);
    }

    /// String-typed ingestion entry point used by readers and live feeds.
    pub fn add_patient_data(
        &self,
        patient_id: PatientId,
        value: f64,
        record_type: &str,
        timestamp: i64,
    ) -> Result<(), VitalsError> {
        let record_type: RecordType = record_type.parse()?;
        if !value.is_finite() {
            return Err(VitalsError::InvalidMeasurement(format!(
                "{} value for patient {} is not finite",
                record_type, patient_id
            )));
        }
        self.add_record(patient_id, value, record_type, timestamp);
        Ok(())
    }

    /// Records of one patient within `[start, end]`, ascending by timestamp.
    /// Unknown patients yield an empty list.
    pub fn get_records(&self, patient_id: PatientId, start: i64, end: i64) -> Vec<PatientRecord> {
        self.patients
            .get(&patient_id)
            .map(|patient| patient.records(start, end))
            .unwrap_or_default()
    }

    /// Snapshot of a single patient
    pub fn get_patient(&self, patient_id: PatientId) -> Option<Patient> {
        self.patients.get(&patient_id).map(|patient| patient.value().clone())
    }

    /// Snapshot of every tracked patient, ordered by id
    pub fn patients(&self) -> Vec<Patient> {
        let mut patients: Vec<Patient> = self
            .patients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        patients.sort_by_key(|p| p.patient_id());
        patients
    }

    pub fn patient_ids(&self) -> Vec<PatientId> {
        let mut ids: Vec<PatientId> = self.patients.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn record_count(&self) -> usize {
        self.patients.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_add_record_creates_patient_once() {
        let storage = DataStorage::new();
        storage.add_record(1, 120.0, RecordType::BloodPressure, 1000);
        storage.add_record(1, 95.0, RecordType::Saturation, 1000);
        storage.add_record(2, 72.0, RecordType::HeartRate, 500);

        assert_eq!(storage.patient_count(), 2);
        assert_eq!(storage.record_count(), 3);
        assert_eq!(storage.patient_ids(), vec![1, 2]);
        assert_eq!(storage.get_patient(1).map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_unknown_patient_is_empty_not_error() {
        let storage = DataStorage::new();
        assert!(storage.get_records(99, i64::MIN, i64::MAX).is_empty());
        assert!(storage.get_patient(99).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_add_patient_data_parses_type_case_insensitively() {
        let storage = DataStorage::new();
        storage.add_patient_data(3, 85.0, "bloodpressure", 1000).unwrap();
        storage.add_patient_data(3, 0.8, "ECG", 2000).unwrap();

        let records = storage.get_records(3, i64::MIN, i64::MAX);
        assert_eq!(records[0].record_type, RecordType::BloodPressure);
        assert_eq!(records[1].record_type, RecordType::Ecg);
    }

    #[test]
    fn test_add_patient_data_rejects_unknown_type_and_nan() {
        let storage = DataStorage::new();

        let err = storage.add_patient_data(3, 85.0, "Temperature", 1000).unwrap_err();
        assert_eq!(err, VitalsError::UnknownRecordType("Temperature".to_string()));

        let err = storage.add_patient_data(3, f64::NAN, "Saturation", 1000).unwrap_err();
        assert!(matches!(err, VitalsError::InvalidMeasurement(_)));

        assert!(storage.is_empty());
    }

    #[test]
    fn test_patients_snapshot_is_ordered_by_id() {
        let storage = DataStorage::new();
        for id in [5, 1, 3] {
            storage.add_record(id, 1.0, RecordType::Alert, 0);
        }
        let ids: Vec<PatientId> = storage.patients().iter().map(|p| p.patient_id()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_snapshot_does_not_see_later_appends() {
        let storage = DataStorage::new();
        storage.add_record(1, 98.0, RecordType::Saturation, 1000);
        let snapshot = storage.get_patient(1).unwrap();

        storage.add_record(1, 90.0, RecordType::Saturation, 2000);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(storage.get_records(1, i64::MIN, i64::MAX).len(), 2);
    }

    #[test]
    fn test_concurrent_appends_to_different_patients() {
        let storage = Arc::new(DataStorage::new());

        std::thread::scope(|scope| {
            for patient_id in 0..8 {
                let storage = Arc::clone(&storage);
                scope.spawn(move || {
                    for ts in 0..250 {
                        storage.add_record(patient_id, ts as f64, RecordType::HeartRate, ts);
                    }
                });
            }
        });

        assert_eq!(storage.patient_count(), 8);
        for patient_id in 0..8 {
            let records = storage.get_records(patient_id, i64::MIN, i64::MAX);
            assert_eq!(records.len(), 250);
            assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }

    fn record_strategy() -> impl Strategy<Value = (f64, i64)> {
        (-500.0f64..500.0, -10_000i64..10_000)
    }

    proptest! {
        #[test]
        fn prop_full_range_read_is_idempotent(records in prop::collection::vec(record_strategy(), 0..60)) {
            let storage = DataStorage::new();
            for (value, ts) in &records {
                storage.add_record(1, *value, RecordType::Saturation, *ts);
            }

            let first = storage.get_records(1, i64::MIN, i64::MAX);
            let second = storage.get_records(1, i64::MIN, i64::MAX);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), records.len());
            prop_assert!(first.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }

        #[test]
        fn prop_range_query_is_exact(
            records in prop::collection::vec(record_strategy(), 0..60),
            start in -12_000i64..12_000,
            span in 0i64..12_000,
        ) {
            let end = start + span;
            let storage = DataStorage::new();
            for (value, ts) in &records {
                storage.add_record(7, *value, RecordType::Ecg, *ts);
            }

            let returned = storage.get_records(7, start, end);
            prop_assert!(returned.iter().all(|r| r.timestamp >= start && r.timestamp <= end));

            let key = |value: f64, ts: i64| (ts, value.to_bits());
            let mut got: Vec<(i64, u64)> = returned.iter().map(|r| key(r.value, r.timestamp)).collect();
            let mut want: Vec<(i64, u64)> = records
                .iter()
                .filter(|(_, ts)| *ts >= start && *ts <= end)
                .map(|(value, ts)| key(*value, *ts))
                .collect();
            got.sort_unstable();
            want.sort_unstable();
            prop_assert_eq!(got, want);
            prop_assert!(returned.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }
}
