// ============================================================================
// Latency Prober Module
// ============================================================================
// ICMP round-trip measurement through the system `ping` binary

use std::time::Duration;
use tracing::{info, warn};

use crate::command_runner::run_command;

const PING_COUNT: &str = "3";
const PING_INTERVAL_SECS: &str = "0.2";
const PING_REPLY_WAIT_SECS: &str = "0.5";
const PING_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LatencyProber {
    program: String,
    timeout: Duration,
}

impl Default for LatencyProber {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyProber {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: PING_TIMEOUT,
        }
    }

    /// Average RTT in milliseconds, `None` when the host did not answer
    pub async fn probe(&self, ip: &str) -> Option<f64> {
        let args = [
            "-c",
            PING_COUNT,
            "-i",
            PING_INTERVAL_SECS,
            "-W",
            PING_REPLY_WAIT_SECS,
            ip,
        ];

        let output = match run_command(&self.program, &args, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Ping failed for {}: {}", ip, e);
                return None;
            }
        };

        match parse_ping_output(&output) {
            Some(ms) => {
                info!("Ping successful for {}: {} ms", ip, ms);
                Some(ms)
            }
            None => {
                warn!("Ping failed for {}: no round-trip time in output", ip);
                None
            }
        }
    }
}

/// Extract the average RTT from ping output.
///
/// Prefers the summary line (`rtt min/avg/max/mdev = 0.041/0.052/0.066/0.010 ms`
/// on Linux, `round-trip min/avg/max/stddev = ...` on BSD). Without one, the
/// per-reply `time=` samples are averaged.
pub fn parse_ping_output(output: &str) -> Option<f64> {
    for line in output.lines() {
        if !line.contains("min/avg/max") {
            continue;
        }
        if let Some(values) = line.split('=').nth(1) {
            let avg = values.trim().split('/').nth(1)?;
            return avg.trim().parse().ok();
        }
    }

    let samples: Vec<f64> = output
        .lines()
        .filter_map(|line| line.split("time=").nth(1))
        .filter_map(|t| t.split_whitespace().next())
        .filter_map(|t| t.trim_end_matches("ms").parse().ok())
        .collect();

    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_summary() {
        let output = "\
PING 10.0.0.5 (10.0.0.5) 56(84) bytes of data.
64 bytes from 10.0.0.5: icmp_seq=1 ttl=57 time=12.1 ms
64 bytes from 10.0.0.5: icmp_seq=2 ttl=57 time=12.4 ms
64 bytes from 10.0.0.5: icmp_seq=3 ttl=57 time=12.0 ms

--- 10.0.0.5 ping statistics ---
3 packets transmitted, 3 received, 0% packet loss, time 402ms
rtt min/avg/max/mdev = 12.012/12.174/12.412/0.171 ms
";
        assert_eq!(parse_ping_output(output), Some(12.174));
    }

    #[test]
    fn test_bsd_summary() {
        let output = "round-trip min/avg/max/stddev = 9.100/9.500/9.900/0.300 ms\n";
        assert_eq!(parse_ping_output(output), Some(9.5));
    }

    #[test]
    fn test_reply_lines_without_summary() {
        let output = "\
64 bytes from 10.0.0.5: icmp_seq=1 ttl=57 time=10.0 ms
64 bytes from 10.0.0.5: icmp_seq=2 ttl=57 time=20.0 ms
";
        assert_eq!(parse_ping_output(output), Some(15.0));
    }

    #[test]
    fn test_total_loss() {
        let output = "\
PING 10.0.0.9 (10.0.0.9) 56(84) bytes of data.

--- 10.0.0.9 ping statistics ---
3 packets transmitted, 0 received, 100% packet loss, time 410ms
";
        assert_eq!(parse_ping_output(output), None);
    }

    #[tokio::test]
    async fn test_missing_ping_binary_is_not_fatal() {
        let prober = LatencyProber::with_program("definitely-not-ping-xyz");
        assert_eq!(prober.probe("10.0.0.5").await, None);
    }
}
