#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// 某個 ETL 階段結束時的資源快照
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseSample {
    pub phase: String,
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub rss_percent: f32,
    /// 從監控開始到此快照的時間
    pub since_start: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Default)]
struct PhaseLog {
    samples: Vec<PhaseSample>,
    peak_rss_mb: u64,
}

/// 記錄 ETL 各階段的 CPU / 記憶體用量，結束時輸出各階段耗時
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    log: Mutex<PhaseLog>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        // 無法取得 PID 時視同關閉監控
        let pid = enabled.then(sysinfo::get_current_pid).and_then(|pid| pid.ok());

        let mut system = System::new_with_specifics(RefreshKind::nothing());
        if pid.is_some() {
            system.refresh_memory();
        }

        Self {
            system: Mutex::new(system),
            pid,
            started: Instant::now(),
            log: Mutex::new(PhaseLog::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_some()
    }

    /// Takes a snapshot for `phase` and appends it to the phase log.
    pub fn record(&self, phase: &str) -> Option<PhaseSample> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = system.process(pid)?;
        let rss_mb = process.memory() / 1024 / 1024;
        let total_mb = system.total_memory() / 1024 / 1024;
        let sample = PhaseSample {
            phase: phase.to_string(),
            cpu_percent: process.cpu_usage(),
            rss_mb,
            rss_percent: if total_mb > 0 {
                rss_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            since_start: self.started.elapsed(),
        };

        let mut log = self.log.lock().ok()?;
        log.peak_rss_mb = log.peak_rss_mb.max(rss_mb);
        log.samples.push(sample.clone());
        Some(sample)
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(sample) = self.record(phase) {
            tracing::info!(
                phase = phase,
                cpu_percent = sample.cpu_percent,
                rss_mb = sample.rss_mb,
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), at {:?}",
                phase,
                sample.cpu_percent,
                sample.rss_mb,
                sample.rss_percent,
                sample.since_start
            );
        }
    }

    /// 各階段耗時 = 與前一個快照的時間差
    pub fn phase_durations(&self) -> Vec<(String, Duration)> {
        let Ok(log) = self.log.lock() else {
            return Vec::new();
        };
        let mut previous = Duration::ZERO;
        log.samples
            .iter()
            .map(|sample| {
                let spent = sample.since_start.saturating_sub(previous);
                previous = sample.since_start;
                (sample.phase.clone(), spent)
            })
            .collect()
    }

    pub fn log_final_stats(&self) {
        if !self.is_enabled() {
            return;
        }
        let peak = self.log.lock().map(|log| log.peak_rss_mb).unwrap_or(0);
        let breakdown: Vec<String> = self
            .phase_durations()
            .into_iter()
            .map(|(phase, spent)| format!("{}={:?}", phase, spent))
            .collect();

        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB, Phases: [{}]",
            self.started.elapsed(),
            peak,
            breakdown.join(", ")
        );
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.record("Extract").is_none());
        assert!(monitor.phase_durations().is_empty());
    }

    #[test]
    fn test_phase_durations_follow_record_order() {
        let monitor = SystemMonitor::new(true);
        if monitor.record("Extract").is_none() {
            return;
        }
        monitor.record("Transform");

        let durations = monitor.phase_durations();
        let phases: Vec<&str> = durations.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(phases, ["Extract", "Transform"]);
    }
}
