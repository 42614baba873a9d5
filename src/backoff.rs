use std::{fmt, sync::Arc, time::Duration};

/// Maps a 1-based retry attempt to the delay waited before it.
///
/// When installed on a client it takes precedence over the fixed retry delay.
#[derive(Clone)]
pub struct Backoff {
    delay: Arc<dyn Fn(u32) -> Duration + Send + Sync>,
    label: &'static str,
}

impl Backoff {
    /// Exponential backoff without jitter: `base * 2^(attempt - 1)`.
    ///
    /// ```
    /// use std::time::Duration;
    /// use resilient_http::Backoff;
    ///
    /// let backoff = Backoff::exponential(Duration::from_millis(100));
    /// assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(400));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self {
            delay: Arc::new(move |attempt| doubled(base, attempt.max(1) - 1)),
            label: "exponential",
        }
    }

    /// Wraps an arbitrary attempt → delay function.
    pub fn from_fn<F>(delay: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            delay: Arc::new(delay),
            label: "custom",
        }
    }

    /// Delay before retry `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        (self.delay)(attempt)
    }
}

/// `base * 2^exp`, clamped to [`Duration::MAX`].
fn doubled(base: Duration, exp: u32) -> Duration {
    let nanos = base.as_nanos();
    if nanos == 0 {
        return Duration::ZERO;
    }
    let max = Duration::MAX.as_nanos();
    match nanos.checked_shl(exp) {
        Some(scaled) if scaled >> exp == nanos && scaled <= max => {
            let secs = u64::try_from(scaled / NANOS_PER_SEC).unwrap_or(u64::MAX);
            // remainder is below 1e9
            Duration::new(secs, (scaled % NANOS_PER_SEC) as u32)
        }
        _ => Duration::MAX,
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backoff").field(&self.label).finish()
    }
}
