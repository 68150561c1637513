mod file;
pub mod format;
mod webhook;

pub use file::FileSink;
pub use webhook::WebhookSink;

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use vitals_core::{Alert, AlertSink};

/// Errors raised while setting up delivery channels. Delivery itself never
/// fails from the caller's point of view.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for alert delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Print alert lines to stdout
    pub console: bool,
    /// Emit a structured `tracing` event per alert
    pub log_events: bool,
    pub alert_file: Option<PathBuf>,
    pub webhook_url: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            console: true,
            log_events: false,
            alert_file: None,
            webhook_url: None,
        }
    }
}

impl DispatchConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup (the environment, a test map).
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str, default: bool| match var(key).as_deref() {
            Some("0") | Some("false") | Some("no") | Some("off") => false,
            Some(_) => true,
            None => default,
        };

        Self {
            console: flag("ALERT_CONSOLE", true),
            log_events: flag("ALERT_LOG_EVENTS", false),
            alert_file: var("ALERT_LOG_FILE").map(PathBuf::from),
            webhook_url: var("ALERT_WEBHOOK_URL"),
        }
    }
}

/// Logs each alert as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&self, alert: Alert) {
        tracing::warn!(
            patient_id = alert.patient_id,
            condition = %alert.condition,
            timestamp = alert.timestamp,
            "[ALERT]"
        );
    }
}

/// Prints `ALERT: Patient <id> - <condition> at <timestamp>` to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

impl AlertSink for ConsoleSink {
    fn deliver(&self, alert: Alert) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", format::console_line(&alert)) {
            tracing::warn!("Failed to print alert: {}", e);
        }
    }
}

/// Keeps every delivered alert in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    alerts: Mutex<Vec<Alert>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the alerts captured so far
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().clone()
    }

    /// Drain the captured alerts
    pub fn take(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Alert>> {
        self.alerts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlertSink for MemorySink {
    fn deliver(&self, alert: Alert) {
        self.lock().push(alert);
    }
}

/// Fans every alert out to all configured sinks.
pub struct AlertDispatcher {
    sinks: Vec<(&'static str, Box<dyn AlertSink>)>,
    webhook: Option<Arc<WebhookSink>>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            webhook: None,
        }
    }

    /// Add a sink to the chain
    pub fn with_sink(mut self, name: &'static str, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push((name, Box::new(sink)));
        self
    }

    /// Build every channel the config asks for. Channels that fail to
    /// initialize are logged and left out.
    pub fn from_config(config: &DispatchConfig) -> Self {
        let mut dispatcher = Self::new();

        if config.console {
            dispatcher = dispatcher.with_sink("console", ConsoleSink);
        }
        if config.log_events {
            dispatcher = dispatcher.with_sink("log", LogSink);
        }

        if let Some(ref path) = config.alert_file {
            match FileSink::new(path) {
                Ok(sink) => {
                    tracing::info!("Writing alerts to {}", sink.path().display());
                    dispatcher = dispatcher.with_sink("file", sink);
                }
                Err(e) => tracing::warn!("Failed to initialize alert file sink: {}", e),
            }
        }

        if let Some(ref url) = config.webhook_url {
            match WebhookSink::new(url) {
                Ok(sink) => {
                    tracing::info!("Webhook alert delivery enabled: {}", sink.url());
                    let sink = Arc::new(sink);
                    dispatcher.webhook = Some(Arc::clone(&sink));
                    dispatcher = dispatcher.with_sink("webhook", sink);
                }
                Err(e) => tracing::warn!("Failed to initialize webhook sink: {}", e),
            }
        }

        if dispatcher.sinks.is_empty() {
            tracing::info!("No alert channels configured; alerts will only be counted");
        }
        dispatcher
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Wait for asynchronous deliveries still in flight.
    pub async fn flush(&self) {
        if let Some(ref webhook) = self.webhook {
            webhook.flush().await;
        }
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for AlertDispatcher {
    fn deliver(&self, alert: Alert) {
        for (name, sink) in &self.sinks {
            tracing::trace!("Dispatching {} via {}", alert.condition, name);
            sink.deliver(alert.clone());
        }
    }
}
