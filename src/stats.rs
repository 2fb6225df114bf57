/// Render pass instrumentation.
///
/// Phase timings are smoothed with an exponential moving average so log
/// lines stay readable instead of jittering with every pass.
use instant::Instant;
use std::time::Duration;

const EMA_ALPHA: f64 = 0.1;

/// Stages of one heat render pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderPhase {
    Project = 0,
    Accumulate = 1,
    Colorize = 2,
    Blit = 3,
}

impl RenderPhase {
    pub const COUNT: usize = 4;
    pub const ALL: [RenderPhase; Self::COUNT] = [
        Self::Project,
        Self::Accumulate,
        Self::Colorize,
        Self::Blit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Accumulate => "accumulate",
            Self::Colorize => "colorize",
            Self::Blit => "blit",
        }
    }
}

/// EMA-smoothed per-phase durations in microseconds.
pub struct PhaseTimers {
    avg_us: [f64; RenderPhase::COUNT],
    started: Option<Instant>,
}

impl PhaseTimers {
    pub fn new() -> Self {
        Self {
            avg_us: [0.0; RenderPhase::COUNT],
            started: None,
        }
    }

    /// Mark the start of the next phase.
    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the current phase and fold its duration into the average.
    pub fn end(&mut self, phase: RenderPhase) {
        if let Some(start) = self.started.take() {
            let us = start.elapsed().as_secs_f64() * 1_000_000.0;
            self.record_us(phase, us);
        }
    }

    pub fn record_us(&mut self, phase: RenderPhase, us: f64) {
        let slot = &mut self.avg_us[phase as usize];
        if *slot == 0.0 {
            *slot = us;
        } else {
            *slot = *slot * (1.0 - EMA_ALPHA) + us * EMA_ALPHA;
        }
    }

    pub fn average_us(&self, phase: RenderPhase) -> f64 {
        self.avg_us[phase as usize]
    }

    pub fn total_us(&self) -> f64 {
        self.avg_us.iter().sum()
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        for phase in RenderPhase::ALL {
            if !out.is_empty() {
                out.push_str(" | ");
            }
            out.push_str(&format!("{} {:.0}us", phase.label(), self.average_us(phase)));
        }
        out
    }
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self::new()
    }
}

/// How often the surface reports pass statistics.
const LOG_EVERY: Duration = Duration::from_secs(5);

/// Counts completed passes and emits a periodic summary line.
pub struct PassStats {
    passes: u64,
    since_log: u64,
    last_log: Instant,
}

impl PassStats {
    pub fn new() -> Self {
        Self {
            passes: 0,
            since_log: 0,
            last_log: Instant::now(),
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn record(&mut self, timers: &PhaseTimers, sources: usize) {
        self.passes += 1;
        self.since_log += 1;
        let elapsed = self.last_log.elapsed();
        if elapsed >= LOG_EVERY {
            let rate = self.since_log as f64 / elapsed.as_secs_f64();
            log::info!(
                "heat pass #{} | {:.2} passes/s | {} sources | {} | pass total {:.0}us",
                self.passes,
                rate,
                sources,
                timers.summary(),
                timers.total_us()
            );
            self.since_log = 0;
            self.last_log = Instant::now();
        }
    }
}

impl Default for PassStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeds_then_smooths() {
        let mut t = PhaseTimers::new();
        t.record_us(RenderPhase::Accumulate, 1000.0);
        assert_eq!(t.average_us(RenderPhase::Accumulate), 1000.0);

        t.record_us(RenderPhase::Accumulate, 2000.0);
        // 1000 * 0.9 + 2000 * 0.1
        assert!((t.average_us(RenderPhase::Accumulate) - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn phases_are_independent() {
        let mut t = PhaseTimers::new();
        t.record_us(RenderPhase::Project, 50.0);
        t.record_us(RenderPhase::Blit, 75.0);
        assert_eq!(t.average_us(RenderPhase::Project), 50.0);
        assert_eq!(t.average_us(RenderPhase::Colorize), 0.0);
        assert!((t.total_us() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn begin_end_records_elapsed() {
        let mut t = PhaseTimers::new();
        t.begin();
        t.end(RenderPhase::Colorize);
        assert!(t.average_us(RenderPhase::Colorize) >= 0.0);
        // end without begin is a no-op
        t.end(RenderPhase::Colorize);
    }

    #[test]
    fn summary_names_every_phase() {
        let mut t = PhaseTimers::new();
        for phase in RenderPhase::ALL {
            t.record_us(phase, 100.0);
        }
        let s = t.summary();
        for phase in RenderPhase::ALL {
            assert!(s.contains(phase.label()), "{s}");
        }
    }

    #[test]
    fn pass_stats_count_passes() {
        let mut stats = PassStats::new();
        let timers = PhaseTimers::new();
        stats.record(&timers, 10);
        stats.record(&timers, 12);
        assert_eq!(stats.passes(), 2);
    }
}
