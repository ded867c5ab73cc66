//! Estimation tunables.
//!
//! [`WaveConfig`] is supplied by the embedding application and read-only to
//! the estimation worker.

use std::time::Duration;

use super::constants;

/// Tunables for the wave-based estimation schedule.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use clockwave::core::WaveConfig;
///
/// let config = WaveConfig::default()
///     .probes_per_wave(4)
///     .probe_interval(Duration::from_millis(20));
/// assert_eq!(config.probes_per_wave, 4);
/// ```
#[derive(Debug, Clone)]
pub struct WaveConfig {
    /// Number of probes sent per wave.
    pub probes_per_wave: u32,

    /// Pacing interval between probes within a wave.
    pub probe_interval: Duration,

    /// Worst round-trip time still waited for before aggregation.
    pub probe_max_rtt: Duration,

    /// Interval between the starts of consecutive waves.
    pub wave_interval: Duration,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            probes_per_wave: constants::DEFAULT_PROBES_PER_WAVE,
            probe_interval: constants::DEFAULT_PROBE_INTERVAL,
            probe_max_rtt: constants::DEFAULT_PROBE_MAX_RTT,
            wave_interval: constants::DEFAULT_WAVE_INTERVAL,
        }
    }
}

impl WaveConfig {
    /// Set the number of probes per wave.
    pub fn probes_per_wave(mut self, count: u32) -> Self {
        self.probes_per_wave = count;
        self
    }

    /// Set the inter-probe pacing interval.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Set the worst round-trip time still waited for.
    pub fn probe_max_rtt(mut self, max_rtt: Duration) -> Self {
        self.probe_max_rtt = max_rtt;
        self
    }

    /// Set the inter-wave interval.
    pub fn wave_interval(mut self, interval: Duration) -> Self {
        self.wave_interval = interval;
        self
    }

    /// Deadline from wave start after which results are aggregated.
    ///
    /// Covers the full probe schedule plus the worst tolerated round trip,
    /// so a fully answered wave is never cut short.
    pub fn aggregation_deadline(&self) -> Duration {
        self.probe_interval * self.probes_per_wave + self.probe_max_rtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WaveConfig::default();
        assert_eq!(config.probes_per_wave, 8);
        assert_eq!(config.probe_interval, Duration::from_millis(64));
        assert_eq!(config.wave_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_aggregation_deadline_covers_schedule() {
        let config = WaveConfig::default()
            .probes_per_wave(8)
            .probe_interval(Duration::from_millis(64))
            .probe_max_rtt(Duration::from_millis(500));

        // 8 * 64ms + 500ms
        assert_eq!(config.aggregation_deadline(), Duration::from_millis(1012));
    }

    #[test]
    fn test_chaining_setters() {
        let config = WaveConfig::default()
            .probes_per_wave(3)
            .probe_interval(Duration::from_millis(10))
            .probe_max_rtt(Duration::from_millis(50))
            .wave_interval(Duration::from_millis(200));

        assert_eq!(config.probes_per_wave, 3);
        assert_eq!(config.probe_interval, Duration::from_millis(10));
        assert_eq!(config.probe_max_rtt, Duration::from_millis(50));
        assert_eq!(config.wave_interval, Duration::from_millis(200));
    }
}
