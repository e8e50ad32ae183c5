//! Progress reporting utilities.
//!
//! [`ProgressCallback`] is the sink the scan pipeline reports to. Two
//! implementations are provided:
//!
//! - [`Progress`] draws indicatif bars in the terminal.
//! - [`ThrottledReporter`] forwards `(percent, status)` pairs to a plain
//!   closure, at most once per interval.
//!
//! Quiet runs attach no callback at all.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for scan phases.
///
/// Phases are reported in order: `"walking"`, `"resolving"`, `"classifying"`.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `item` - Path or title being processed
    fn on_progress(&self, current: usize, item: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Progress reporter using indicatif.
///
/// Keeps one bar per pipeline phase.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    resolving: Mutex<Option<ProgressBar>>,
    classifying: Mutex<Option<ProgressBar>>,
    prefix: Mutex<String>,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Examples
    ///
    /// ```
    /// use romdedupe::progress::Progress;
    ///
    /// let progress = Progress::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            resolving: Mutex::new(None),
            classifying: Mutex::new(None),
            prefix: Mutex::new(String::new()),
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(color: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!(
            "[{{elapsed_precise}}] [{{bar:40.{color}/blue}}] {{pos}}/{{len}} ({{percent}}%) {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            "walking" => Some(&self.walking),
            "resolving" => Some(&self.resolving),
            "classifying" => Some(&self.classifying),
            _ => None,
        }
    }

    /// The most recently started bar that is still active.
    fn with_active_bar(&self, f: impl FnOnce(&ProgressBar)) {
        for slot in [&self.classifying, &self.resolving, &self.walking] {
            if let Some(ref pb) = *lock(slot) {
                f(pb);
                return;
            }
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let pb = match phase {
            "walking" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "resolving" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("cyan"));
                pb.set_message("Resolving titles");
                pb
            }
            _ => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style("green"));
                pb.set_message(phase.to_string());
                pb
            }
        };

        if let Some(slot) = self.slot(phase) {
            *lock(slot) = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, item: &str) {
        let display_msg = {
            let prefix = lock(&self.prefix);
            if prefix.is_empty() {
                truncate_path(item, 30)
            } else {
                format!("{}: {}", *prefix, truncate_path(item, 30))
            }
        };

        self.with_active_bar(|pb| {
            pb.set_position(current as u64);
            pb.set_message(display_msg);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        lock(&self.prefix).clear();
        let Some(pb) = self.slot(phase).and_then(|slot| lock(slot).take()) else {
            return;
        };
        pb.finish_with_message(match phase {
            "walking" => "Walking complete",
            "resolving" => "Resolving complete",
            _ => "Classifying complete",
        });
    }

    fn on_message(&self, message: &str) {
        *lock(&self.prefix) = message.to_string();
        self.with_active_bar(|pb| pb.set_message(message.to_string()));
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

/// Default minimum time between [`ThrottledReporter`] updates.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(100);

type StatusSink = Box<dyn Fn(f64, &str) + Send + Sync>;

#[derive(Debug, Default)]
struct ThrottleState {
    phase: String,
    total: usize,
    last_emit: Option<Instant>,
}

/// Forwards progress as `(percent_complete, status_message)` to a closure.
///
/// Item updates are dropped if the previous update was less than the
/// interval ago. Phase boundaries are always forwarded.
///
/// # Example
///
/// ```
/// use romdedupe::progress::{ProgressCallback, ThrottledReporter};
///
/// let reporter = ThrottledReporter::new(|percent, status| {
///     eprintln!("{percent:>5.1}% {status}");
/// });
/// reporter.on_phase_start("resolving", 10);
/// reporter.on_progress(5, "Metroid");
/// reporter.on_phase_end("resolving");
/// ```
pub struct ThrottledReporter {
    sink: StatusSink,
    interval: Duration,
    state: Mutex<ThrottleState>,
}

impl std::fmt::Debug for ThrottledReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledReporter")
            .field("sink", &"<callback>")
            .field("interval", &self.interval)
            .field("state", &self.state)
            .finish()
    }
}

impl ThrottledReporter {
    /// Create a reporter with the default interval.
    #[must_use]
    pub fn new(sink: impl Fn(f64, &str) + Send + Sync + 'static) -> Self {
        Self::with_interval(sink, DEFAULT_THROTTLE)
    }

    /// Create a reporter with a custom interval.
    #[must_use]
    pub fn with_interval(
        sink: impl Fn(f64, &str) + Send + Sync + 'static,
        interval: Duration,
    ) -> Self {
        Self {
            sink: Box::new(sink),
            interval,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    fn emit(&self, state: &mut ThrottleState, percent: f64, status: &str) {
        state.last_emit = Some(Instant::now());
        (self.sink)(percent, status);
    }
}

impl ProgressCallback for ThrottledReporter {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let mut state = lock(&self.state);
        state.phase = phase.to_string();
        state.total = total;
        self.emit(&mut state, 0.0, &format!("{phase}: started"));
    }

    fn on_progress(&self, current: usize, item: &str) {
        let mut state = lock(&self.state);
        let due = state
            .last_emit
            .is_none_or(|last| last.elapsed() >= self.interval);
        if !due {
            return;
        }
        let percent = if state.total == 0 {
            0.0
        } else {
            (current.min(state.total) as f64 / state.total as f64) * 100.0
        };
        let status = format!("{}: {}", state.phase, item);
        self.emit(&mut state, percent, &status);
    }

    fn on_phase_end(&self, phase: &str) {
        let mut state = lock(&self.state);
        self.emit(&mut state, 100.0, &format!("{phase}: done"));
    }

    fn on_message(&self, message: &str) {
        let mut state = lock(&self.state);
        let due = state
            .last_emit
            .is_none_or(|last| last.elapsed() >= self.interval);
        if due {
            self.emit(&mut state, 0.0, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recording(interval: Duration) -> (ThrottledReporter, Arc<Mutex<Vec<(f64, String)>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let reporter = ThrottledReporter::with_interval(
            move |percent, status: &str| {
                sink_events.lock().unwrap().push((percent, status.to_string()));
            },
            interval,
        );
        (reporter, events)
    }

    #[test]
    fn test_progress_phase_lifecycle() {
        let progress = Progress::new();
        progress.on_phase_start("resolving", 3);
        assert!(lock(&progress.resolving).is_some());
        progress.on_progress(2, "Metroid");
        progress.on_phase_end("resolving");
        assert!(lock(&progress.resolving).is_none());
    }

    #[test]
    fn test_truncate_path_short() {
        assert_eq!(truncate_path("short.zip", 30), "short.zip");
    }

    #[test]
    fn test_truncate_path_long() {
        let long = "/very/long/directory/structure/that/goes/on/Game (USA).zip";
        assert_eq!(truncate_path(long, 30), ".../Game (USA).zip");
    }

    #[test]
    fn test_truncate_path_multibyte() {
        let name = "ドラゴンクエストⅤ 天空の花嫁 (Japan) (Rev 1) (Special).sfc";
        let truncated = truncate_path(name, 20);
        assert!(truncated.starts_with("..."));
        assert_eq!(truncated.chars().count(), 20);
    }

    #[test]
    fn test_throttled_reporter_percentages() {
        let (reporter, events) = recording(Duration::ZERO);
        reporter.on_phase_start("resolving", 4);
        reporter.on_progress(1, "A");
        reporter.on_progress(2, "B");
        reporter.on_phase_end("resolving");

        let events = events.lock().unwrap();
        let percents: Vec<f64> = events.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![0.0, 25.0, 50.0, 100.0]);
        assert_eq!(events[1].1, "resolving: A");
        assert_eq!(events[3].1, "resolving: done");
    }

    #[test]
    fn test_throttled_reporter_drops_frequent_updates() {
        let (reporter, events) = recording(Duration::from_secs(3600));
        reporter.on_phase_start("classifying", 100);
        for i in 1..=100 {
            reporter.on_progress(i, "bucket");
        }
        reporter.on_phase_end("classifying");

        // Only the phase boundaries get through.
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_throttled_reporter_unknown_total() {
        let (reporter, events) = recording(Duration::ZERO);
        reporter.on_phase_start("walking", 0);
        reporter.on_progress(7, "/roms/Game.nes");
        assert_eq!(events.lock().unwrap()[1].0, 0.0);
    }
}
