use std::path::PathBuf;

use alert_dispatch::DispatchConfig;
use anyhow::{bail, Context};
use vitals_core::PatientId;

pub const USAGE: &str = "\
Usage:
  vitals-monitor --data-dir PATH [options]

Options:
  --data-dir PATH      Directory (or single file) of patientId,timestamp,recordType,value lines
                       (default: $VITALS_DATA_DIR)
  --patient ID         Evaluate only this patient
  --alerts-file PATH   Append alerts to PATH (default: $ALERT_LOG_FILE)
  --webhook URL        POST alerts as JSON to URL (default: $ALERT_WEBHOOK_URL)
  --log-alerts         Also emit each alert as a tracing event
  --quiet              Do not print alerts to stdout";

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub data_dir: PathBuf,
    pub patient: Option<PatientId>,
    pub dispatch: DispatchConfig,
}

impl CliOptions {
    /// Parse command-line flags on top of environment defaults.
    pub fn parse(args: &[String], env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value_of = |flag: &str| -> anyhow::Result<Option<String>> {
            match args.iter().position(|a| a == flag) {
                Some(i) => match args.get(i + 1).filter(|v| !v.starts_with("--")) {
                    Some(v) => Ok(Some(v.clone())),
                    None => bail!("{} expects a value", flag),
                },
                None => Ok(None),
            }
        };
        let has = |flag: &str| args.iter().any(|a| a == flag);

        let data_dir = value_of("--data-dir")?
            .or_else(|| env("VITALS_DATA_DIR").filter(|v| !v.trim().is_empty()))
            .map(PathBuf::from);
        let Some(data_dir) = data_dir else {
            bail!("no data source given (use --data-dir or set VITALS_DATA_DIR)");
        };

        let patient = value_of("--patient")?
            .map(|id| {
                id.parse::<PatientId>()
                    .with_context(|| format!("invalid patient id: {}", id))
            })
            .transpose()?;

        let mut dispatch = DispatchConfig::from_vars(&env);
        if let Some(path) = value_of("--alerts-file")? {
            dispatch.alert_file = Some(PathBuf::from(path));
        }
        if let Some(url) = value_of("--webhook")? {
            dispatch.webhook_url = Some(url);
        }
        if has("--log-alerts") {
            dispatch.log_events = true;
        }
        if has("--quiet") {
            dispatch.console = false;
        }

        Ok(Self {
            data_dir,
            patient,
            dispatch,
        })
    }
}
