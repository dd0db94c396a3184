// Time Provider Port (ledger and entity timestamps)

/// Time provider interface (allows fixed clocks in tests)
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds since epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant
pub struct FixedTimeProvider(pub i64);

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
