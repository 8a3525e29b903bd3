use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use log::info;
use rand::Rng;
use crate::error::GfuError;

const MAX_DELAY_SECS: f64 = 86_400.0;

/// Wait between search result pages, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelaySpec {
    Fixed(f64),
    Range(f64, f64),
}

impl DelaySpec {
    pub fn parse(input: &str) -> Result<Self, GfuError> {
        let invalid = || GfuError::InvalidDelay(input.to_string());
        let parse_secs = |s: &str| -> Result<f64, GfuError> {
            let secs: f64 = s.trim().parse().map_err(|_| invalid())?;
            if !secs.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&secs) {
                return Err(invalid());
            }
            Ok(secs)
        };

        match input.trim().split_once('-') {
            Some((low, high)) => {
                let (low, high) = (parse_secs(low)?, parse_secs(high)?);
                if low > high {
                    return Err(invalid());
                }
                Ok(DelaySpec::Range(low, high))
            }
            None => Ok(DelaySpec::Fixed(parse_secs(input)?)),
        }
    }

    /// Draws one wait. Fixed delays always return the same value.
    pub fn sample(&self) -> Duration {
        let secs = match *self {
            DelaySpec::Fixed(secs) => secs,
            DelaySpec::Range(low, high) if low == high => low,
            DelaySpec::Range(low, high) => rand::thread_rng().gen_range(low..=high),
        };
        Duration::from_secs_f64(secs)
    }

    pub fn wait(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        info!("Waiting for {:.1} seconds (Page Delay)...", delay.as_secs_f64());
        thread::sleep(delay);
    }
}

impl Default for DelaySpec {
    fn default() -> Self {
        DelaySpec::Fixed(30.0)
    }
}

impl FromStr for DelaySpec {
    type Err = GfuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DelaySpec::parse(s)
    }
}

impl fmt::Display for DelaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelaySpec::Fixed(secs) => write!(f, "{}s", secs),
            DelaySpec::Range(low, high) => write!(f, "{}-{}s", low, high),
        }
    }
}

/// Retry policy for HTTP 429 responses: the wait doubles on each attempt.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub max_retries: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        Backoff { base, max_retries }
    }

    /// Wait before retry number `attempt` (1-based), or `None` once retries are exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.base.saturating_mul(factor))
    }

    pub fn wait(&self, attempt: u32) -> bool {
        match self.delay_for(attempt) {
            Some(delay) => {
                info!(
                    "Rate limited. Waiting for {} seconds before retry {}/{}...",
                    delay.as_secs(),
                    attempt,
                    self.max_retries
                );
                thread::sleep(delay);
                true
            }
            None => false,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(Duration::from_secs(60), 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_and_range() {
        assert_eq!(DelaySpec::parse("30").unwrap(), DelaySpec::Fixed(30.0));
        assert_eq!(DelaySpec::parse(" 2.5 ").unwrap(), DelaySpec::Fixed(2.5));
        assert_eq!(DelaySpec::parse("10-40").unwrap(), DelaySpec::Range(10.0, 40.0));
    }

    #[test]
    fn rejects_bad_delays() {
        for bad in ["", "abc", "40-10", "5-", "-5", "nan", "inf", "100000"] {
            assert!(DelaySpec::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn range_samples_stay_in_bounds() {
        let spec = DelaySpec::Range(0.5, 1.5);
        for _ in 0..200 {
            let d = spec.sample().as_secs_f64();
            assert!((0.5..=1.5).contains(&d));
        }
        assert_eq!(DelaySpec::Range(2.0, 2.0).sample(), Duration::from_secs(2));
        assert_eq!(DelaySpec::Fixed(0.0).sample(), Duration::ZERO);
    }

    #[test]
    fn backoff_doubles_until_exhausted() {
        let backoff = Backoff::new(Duration::from_secs(60), 3);
        assert_eq!(backoff.delay_for(1), Some(Duration::from_secs(60)));
        assert_eq!(backoff.delay_for(2), Some(Duration::from_secs(120)));
        assert_eq!(backoff.delay_for(3), Some(Duration::from_secs(240)));
        assert_eq!(backoff.delay_for(4), None);
        assert_eq!(backoff.delay_for(0), None);
    }
}
