//! vitals-monitor: ingest patient measurement files and raise clinical alerts.
//!
//! Reads every `patientId,timestamp,recordType,value` file under the data
//! directory, runs the alert rules for every tracked patient (or just one)
//! and delivers the alerts to stdout, an alert file and/or a webhook.
//!
//! Usage:
//!   cargo run -p monitor-cli -- --data-dir ./output
//!   cargo run -p monitor-cli -- --data-dir ./output --patient 12 --quiet --alerts-file alerts.txt

mod options;

use std::sync::Arc;

use alert_dispatch::AlertDispatcher;
use alert_engine::{AlertEngine, EvaluationReport};
use anyhow::Context;
use data_storage::{DataReader, DataStorage, FileDataReader};
use options::{CliOptions, USAGE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vitals_monitor=info,data_storage=info,alert_engine=info,alert_dispatch=info".into()
            }),
        );
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }
    let options = match CliOptions::parse(&args, |key| std::env::var(key).ok()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {:#}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    tracing::info!(
        "vitals-monitor: data={}, patient={}, sinks: console={} log={} file={} webhook={}",
        options.data_dir.display(),
        options
            .patient
            .map(|id| id.to_string())
            .unwrap_or_else(|| "all".to_string()),
        options.dispatch.console,
        options.dispatch.log_events,
        options.dispatch.alert_file.is_some(),
        options.dispatch.webhook_url.is_some(),
    );

    let storage = Arc::new(DataStorage::new());
    let reader = FileDataReader::new(&options.data_dir);
    let summary = {
        let storage = Arc::clone(&storage);
        tokio::task::spawn_blocking(move || reader.read_data(&storage))
            .await
            .context("ingestion task panicked")?
            .with_context(|| format!("failed to ingest {}", options.data_dir.display()))?
    };
    tracing::info!(
        "Tracking {} patient(s), {} record(s); {} line(s) skipped",
        storage.patient_count(),
        storage.record_count(),
        summary.lines_skipped
    );

    // Built inside the runtime so the webhook sink can spawn deliveries.
    let dispatcher = Arc::new(AlertDispatcher::from_config(&options.dispatch));
    let engine = AlertEngine::new();

    let reports: Vec<EvaluationReport> = {
        let storage = Arc::clone(&storage);
        let dispatcher = Arc::clone(&dispatcher);
        let patient = options.patient;
        tokio::task::spawn_blocking(move || match patient {
            Some(id) => engine
                .evaluate_patient_id(&storage, id, dispatcher.as_ref())
                .into_iter()
                .collect(),
            None => engine.evaluate_storage(&storage, dispatcher.as_ref()),
        })
        .await
        .context("evaluation task panicked")?
    };

    dispatcher.flush().await;

    if let Some(id) = options.patient {
        if reports.is_empty() {
            anyhow::bail!("patient {} has no records in {}", id, options.data_dir.display());
        }
    }

    let alerts: usize = reports.iter().map(|r| r.alerts_emitted).sum();
    let failed: Vec<&EvaluationReport> = reports.iter().filter(|r| !r.is_clean()).collect();
    for report in &failed {
        tracing::warn!(
            "Patient {}: rule(s) failed: {:?}",
            report.patient_id,
            report.failed_rules
        );
    }
    tracing::info!(
        "Done! {} alert(s) across {} patient(s) ({} with rule failures)",
        alerts,
        reports.len(),
        failed.len()
    );
    Ok(())
}
