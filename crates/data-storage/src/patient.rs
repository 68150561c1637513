use vitals_core::{PatientId, PatientRecord, RecordType};

/// A patient and every measurement recorded for them, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    patient_id: PatientId,
    records: Vec<PatientRecord>,
}

impl Patient {
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            records: Vec::new(),
        }
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    /// Append a reading. Timestamps need not arrive in order.
    pub fn add_record(&mut self, value: f64, record_type: RecordType, timestamp: i64) {
        self.records
            .push(PatientRecord::new(self.patient_id, value, record_type, timestamp));
    }

    /// Records with `start <= timestamp <= end`, ascending by timestamp.
    ///
    /// The sort is stable, so readings sharing a timestamp keep their
    /// insertion order.
    pub fn records(&self, start: i64, end: i64) -> Vec<PatientRecord> {
        let mut matching: Vec<PatientRecord> = self
            .records
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        matching
    }

    /// Full history, ascending by timestamp
    pub fn all_records(&self) -> Vec<PatientRecord> {
        self.records(i64::MIN, i64::MAX)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
