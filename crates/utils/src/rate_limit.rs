use std::time::{Duration, Instant};

/// Paces outgoing requests to at most one per `period`.
pub struct RateLimit {
    pub count: u64,

    pub last: Instant,
    pub period: Option<Duration>,
}

impl RateLimit {
    pub fn unlimited() -> Self {
        Self {
            count: 0,
            last: Instant::now(),
            period: None,
        }
    }

    pub fn new_frequency(freq_per_second: f32) -> Self {
        let p = Duration::from_secs_f32(1.0 / freq_per_second);
        Self {
            count: 0,
            last: Instant::now().checked_sub(p).unwrap_or_else(Instant::now),
            period: Some(p),
        }
    }

    pub fn from_requests_per_second(rps: Option<f32>) -> Self {
        match rps {
            Some(freq) if freq > 0.0 => Self::new_frequency(freq),
            _ => Self::unlimited(),
        }
    }
}

impl RateLimit {
    /// How long the caller has to wait before the next request may go out.
    pub fn delay(&self) -> Duration {
        match self.period {
            Some(period) => (self.last + period).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    pub async fn wait_and_increment_async(&mut self) {
        let wait = self.delay();
        // reserve the slot before sleeping so that the next caller queues behind us
        self.count += 1;
        self.last = Instant::now() + wait;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last = Instant::now()
            .checked_sub(self.period.unwrap_or_default())
            .unwrap_or_else(Instant::now);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    #[test]
    fn test_unlimited_never_waits() {
        let rl = super::RateLimit::from_requests_per_second(None);
        assert_eq!(rl.delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_frequency_rate_limit_async() {
        let mut rl = super::RateLimit::new_frequency(20.0);
        let start = Instant::now();
        for _ in 0..4 {
            rl.wait_and_increment_async().await;
        }
        // first request is free, the other three wait 50ms each
        assert!(start.elapsed() >= Duration::from_millis(140));
        assert_eq!(rl.count, 4);
    }
}
