#[cfg(test)]
mod tests {
    use super::super::rules::*;
    use vitals_core::{Alert, AlertCondition, PatientRecord, RecordType};

    // Helper to build a timestamp-sorted series of one record type
    fn series(record_type: RecordType, points: &[(f64, i64)]) -> Vec<PatientRecord> {
        points
            .iter()
            .map(|&(value, ts)| PatientRecord::new(1, value, record_type, ts))
            .collect()
    }

    fn timestamps(alerts: impl Iterator<Item = Alert>) -> Vec<i64> {
        alerts.map(|a| a.timestamp).collect()
    }

    const MINUTE: i64 = 60 * 1000;

    #[test]
    fn test_trend_needs_three_readings() {
        let t = RuleThresholds::default();
        let bp = series(RecordType::BloodPressure, &[(100.0, 1000), (150.0, 2000)]);

        assert_eq!(blood_pressure_trend(1, &bp, &t).count(), 0);
        assert_eq!(blood_pressure_trend(1, &[], &t).count(), 0);
    }

    #[test]
    fn test_trend_sustained_fall() {
        let t = RuleThresholds::default();
        let bp = series(
            RecordType::BloodPressure,
            &[(140.0, 1000), (125.0, 2000), (110.0, 3000)],
        );

        let alerts: Vec<Alert> = blood_pressure_trend(7, &bp, &t).collect();
        assert_eq!(alerts, vec![Alert::new(7, AlertCondition::BloodPressureTrend, 3000)]);
    }

    #[test]
    fn test_trend_windows_overlap() {
        let t = RuleThresholds::default();
        let bp = series(
            RecordType::BloodPressure,
            &[(100.0, 1000), (115.0, 2000), (130.0, 3000), (145.0, 4000)],
        );

        assert_eq!(timestamps(blood_pressure_trend(1, &bp, &t)), vec![3000, 4000]);
    }

    #[test]
    fn test_trend_requires_strictly_more_than_step() {
        let t = RuleThresholds::default();
        let bp = series(
            RecordType::BloodPressure,
            &[(100.0, 1000), (110.0, 2000), (125.0, 3000)],
        );
        assert_eq!(blood_pressure_trend(1, &bp, &t).count(), 0);

        // rise then fall is not a trend
        let zigzag = series(
            RecordType::BloodPressure,
            &[(100.0, 1000), (120.0, 2000), (100.0, 3000)],
        );
        assert_eq!(blood_pressure_trend(1, &zigzag, &t).count(), 0);
    }

    #[test]
    fn test_critical_blood_pressure_bounds() {
        let t = RuleThresholds::default();
        let bp = series(
            RecordType::BloodPressure,
            &[
                (90.0, 1000),
                (120.0, 2000),
                (89.9, 3000),
                (120.1, 4000),
                (200.0, 5000),
                (50.0, 6000),
            ],
        );

        assert_eq!(
            timestamps(critical_blood_pressure(1, &bp, &t)),
            vec![3000, 4000, 5000, 6000]
        );
    }

    #[test]
    fn test_low_saturation_threshold_is_strict() {
        let t = RuleThresholds::default();
        let sat = series(RecordType::Saturation, &[(92.0, 1000), (91.9, 2000), (98.0, 3000)]);

        assert_eq!(timestamps(low_saturation(1, &sat, &t)), vec![2000]);
    }

    #[test]
    fn test_rapid_drop_single_reading() {
        let t = RuleThresholds::default();
        let sat = series(RecordType::Saturation, &[(91.0, 1000)]);

        assert_eq!(rapid_saturation_drop(1, &sat, &t).count(), 0);
    }

    #[test]
    fn test_rapid_drop_window_is_inclusive() {
        let t = RuleThresholds::default();
        let sat = series(
            RecordType::Saturation,
            &[(98.0, 0), (93.0, 10 * MINUTE), (88.0, 20 * MINUTE + 1)],
        );

        // 98 -> 93 exactly 10 minutes apart counts; 93 -> 88 is 1ms too late
        assert_eq!(timestamps(rapid_saturation_drop(1, &sat, &t)), vec![10 * MINUTE]);
    }

    #[test]
    fn test_rapid_drop_scans_all_pairs() {
        let t = RuleThresholds::default();
        let sat = series(
            RecordType::Saturation,
            &[(99.0, 0), (98.0, MINUTE), (93.0, 2 * MINUTE)],
        );

        // both earlier readings pair with the drop, non-adjacent pair included
        let alerts: Vec<Alert> = rapid_saturation_drop(1, &sat, &t).collect();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.timestamp == 2 * MINUTE));
        assert!(alerts
            .iter()
            .all(|a| a.condition == AlertCondition::RapidSaturationDrop));
    }

    #[test]
    fn test_rapid_drop_ignores_rises() {
        let t = RuleThresholds::default();
        let sat = series(RecordType::Saturation, &[(90.0, 0), (97.0, MINUTE)]);

        assert_eq!(rapid_saturation_drop(1, &sat, &t).count(), 0);
    }

    #[test]
    fn test_hypoxemia_window_is_strict() {
        let t = RuleThresholds::default();
        let bp = series(RecordType::BloodPressure, &[(85.0, 0)]);
        let near = series(RecordType::Saturation, &[(90.0, 5 * MINUTE - 1)]);
        let edge = series(RecordType::Saturation, &[(90.0, 5 * MINUTE)]);

        assert_eq!(
            timestamps(hypotensive_hypoxemia(1, &bp, &near, &t)),
            vec![5 * MINUTE - 1]
        );
        assert_eq!(hypotensive_hypoxemia(1, &bp, &edge, &t).count(), 0);
    }

    #[test]
    fn test_hypoxemia_uses_later_timestamp_either_side() {
        let t = RuleThresholds::default();
        let bp = series(RecordType::BloodPressure, &[(80.0, 2 * MINUTE)]);
        let sat = series(RecordType::Saturation, &[(88.0, MINUTE), (89.0, 3 * MINUTE)]);

        assert_eq!(
            timestamps(hypotensive_hypoxemia(1, &bp, &sat, &t)),
            vec![2 * MINUTE, 3 * MINUTE]
        );
    }

    #[test]
    fn test_hypoxemia_requires_both_low() {
        let t = RuleThresholds::default();
        let low_bp = series(RecordType::BloodPressure, &[(85.0, 0)]);
        let ok_bp = series(RecordType::BloodPressure, &[(95.0, 0)]);
        let low_sat = series(RecordType::Saturation, &[(90.0, 0)]);
        let ok_sat = series(RecordType::Saturation, &[(96.0, 0)]);

        assert_eq!(hypotensive_hypoxemia(1, &low_bp, &ok_sat, &t).count(), 0);
        assert_eq!(hypotensive_hypoxemia(1, &ok_bp, &low_sat, &t).count(), 0);
        assert_eq!(hypotensive_hypoxemia(1, &low_bp, &low_sat, &t).count(), 1);
    }

    #[test]
    fn test_ecg_needs_full_window() {
        let t = RuleThresholds::default();
        let ecg = series(
            RecordType::Ecg,
            &[(1.0, 1000), (1.0, 2000), (1.0, 3000), (1.0, 4000), (50.0, 5000)],
        );

        assert_eq!(ecg_peak(1, &ecg, &t).count(), 0);
    }

    #[test]
    fn test_ecg_sustained_run_fires_per_position() {
        let t = RuleThresholds::default();
        let ecg = series(
            RecordType::Ecg,
            &[
                (1.0, 1000),
                (1.0, 2000),
                (1.0, 3000),
                (1.0, 4000),
                (1.0, 5000),
                (10.0, 6000),
                (10.0, 7000),
            ],
        );

        // mean before 7000 is (1+1+1+1+10)/5 = 2.8; 10 > 4.2
        assert_eq!(timestamps(ecg_peak(1, &ecg, &t)), vec![6000, 7000]);
    }

    #[test]
    fn test_ecg_oversized_window_never_fires() {
        let t = RuleThresholds {
            ecg_window: usize::MAX,
            ..RuleThresholds::default()
        };
        let ecg = series(RecordType::Ecg, &[(1.0, 1000), (9.0, 2000)]);
        assert_eq!(ecg_peak(1, &ecg, &t).count(), 0);
    }

    #[test]
    fn test_ecg_peak_is_strictly_greater() {
        let t = RuleThresholds::default();
        let ecg = series(
            RecordType::Ecg,
            &[(2.0, 1), (2.0, 2), (2.0, 3), (2.0, 4), (2.0, 5), (3.0, 6)],
        );

        assert_eq!(ecg_peak(1, &ecg, &t).count(), 0);
    }

    #[test]
    fn test_triggered_alert_passthrough() {
        let manual = series(RecordType::Alert, &[(0.0, 1000), (1.0, 2000)]);

        assert_eq!(timestamps(triggered_alert(3, &manual)), vec![1000, 2000]);
    }

    #[test]
    fn test_rule_order_and_conditions() {
        let conditions: Vec<AlertCondition> = Rule::ALL.iter().map(|r| r.condition()).collect();
        assert_eq!(
            conditions,
            vec![
                AlertCondition::BloodPressureTrend,
                AlertCondition::CriticalBloodPressure,
                AlertCondition::LowSaturation,
                AlertCondition::RapidSaturationDrop,
                AlertCondition::HypotensiveHypoxemia,
                AlertCondition::EcgPeak,
                AlertCondition::Triggered,
            ]
        );
    }
}
