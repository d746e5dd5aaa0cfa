//! Progress reporting and console logging.
//!
//! Row loops report through a [`Phase`], which draws an indicatif bar in
//! interactive use. In log-only mode the bar is hidden and the phase prints
//! tail-friendly `[phase] current/total (pct%)` lines to stderr instead.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::models::RowWarning;

/// Global flag for log-only mode (set from args in each binary)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Rows between log lines in log-only mode.
pub const LOG_INTERVAL: u64 = 5_000;

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress bar with consistent styling, hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Spinner for steps without a known length (file loads).
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Should a log-only line be printed at `current`?
pub fn should_log(current: u64, total: u64, interval: u64) -> bool {
    interval > 0 && (current % interval == 0 || current == total)
}

/// A named pass over a known number of rows.
pub struct Phase {
    name: String,
    total: u64,
    current: u64,
    bar: ProgressBar,
}

impl Phase {
    pub fn new(name: &str, total: usize) -> Self {
        let total = total as u64;
        Self {
            name: name.to_string(),
            total,
            current: 0,
            bar: create_progress_bar(total, name),
        }
    }

    pub fn inc(&mut self) {
        self.current += 1;
        self.bar.inc(1);
        if is_log_only() && should_log(self.current, self.total, LOG_INTERVAL) {
            let pct = if self.total == 0 {
                100.0
            } else {
                100.0 * self.current as f64 / self.total as f64
            };
            eprintln!("[{}] {}/{} ({:.1}%)", self.name, self.current, self.total, pct);
        }
    }

    pub fn finish(self, msg: String) {
        if is_log_only() {
            eprintln!("[{}] {}", self.name, msg);
        }
        self.bar.finish_with_message(msg);
    }
}

/// Prints row-level warnings to stderr.
pub fn report_warnings(warnings: &[RowWarning]) {
    for w in warnings {
        eprintln!("Warning: {}", w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_should_log_intervals() {
        assert!(should_log(5_000, 12_000, 5_000));
        assert!(!should_log(5_001, 12_000, 5_000));
        assert!(should_log(12_000, 12_000, 5_000));
        assert!(!should_log(3, 10, 0));
    }

    #[test]
    fn test_phase_counts_rows() {
        let mut phase = Phase::new("test", 3);
        for _ in 0..3 {
            phase.inc();
        }
        assert_eq!(phase.current, 3);
        phase.finish("done".to_string());
    }
}
