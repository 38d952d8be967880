use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, RefreshKind, System};

/// Resource usage of the migration process at one sampling point.
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub cpu_percent: f32,
    pub resident_mb: u64,
    pub peak_resident_mb: u64,
    pub elapsed: Duration,
}

struct MonitorState {
    system: System,
    pid: Pid,
    peak_resident_mb: u64,
}

/// Samples CPU and memory of this process between migration phases.
/// A disabled monitor never touches sysinfo at all.
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    started: Instant,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let state = enabled.then(|| {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            // 先刷新一次才拿得到進程資訊
            system.refresh_all();
            let pid = sysinfo::get_current_pid().expect("Failed to get current PID");
            Mutex::new(MonitorState {
                system,
                pid,
                peak_resident_mb: 0,
            })
        });

        Self {
            state,
            started: Instant::now(),
        }
    }

    pub fn sample(&self) -> Option<PhaseStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        state.system.refresh_all();

        let (cpu_percent, resident_mb) = {
            let process = state.system.process(state.pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        if resident_mb > state.peak_resident_mb {
            state.peak_resident_mb = resident_mb;
        }

        Some(PhaseStats {
            cpu_percent,
            resident_mb,
            peak_resident_mb: state.peak_resident_mb,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB (peak {}MB), Elapsed: {:?}",
                phase,
                stats.cpu_percent,
                stats.resident_mb,
                stats.peak_resident_mb,
                stats.elapsed
            );
        }
    }

    pub fn log_summary(&self) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Total time: {:?}, peak memory: {}MB",
                stats.elapsed,
                stats.peak_resident_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
