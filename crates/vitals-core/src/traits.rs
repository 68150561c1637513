use crate::Alert;

/// Consumer of alerts produced by the evaluation engine.
///
/// Delivery is push-based and infallible from the engine's point of view:
/// a sink that cannot deliver must handle (log, drop) the failure itself.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: Alert);
}

impl<S: AlertSink + ?Sized> AlertSink for std::sync::Arc<S> {
    fn deliver(&self, alert: Alert) {
        (**self).deliver(alert)
    }
}

impl<S: AlertSink + ?Sized> AlertSink for Box<S> {
    fn deliver(&self, alert: Alert) {
        (**self).deliver(alert)
    }
}
