/// Outward channel for operator-facing messages, such as the host console.
///
/// The registry only reports first-time creation of the data file here.
/// Everything else goes through `tracing`.
pub trait MessageSink: Send + Sync {
    fn send_message(&self, message: &str);
}

impl<F> MessageSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn send_message(&self, message: &str) {
        self(message)
    }
}
