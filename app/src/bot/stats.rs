use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Number of recent translations the average is computed over
pub const RECENT_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct Counters {
    completed: u64,
    total: Duration,
    recent: VecDeque<Duration>,
}

/// Usage statistics shared by all message handlers
#[derive(Debug)]
pub struct BotStats {
    started: Instant,
    counters: Mutex<Counters>,
}

/// Point-in-time copy of [`BotStats`]
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub uptime: Duration,
    pub translations_completed: u64,
    pub total_translation_time: Duration,
    /// Average over the last [`RECENT_WINDOW`] translations
    pub average_translation_time: Duration,
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            counters: Mutex::new(Counters::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record one completed translation
    pub fn record_translation(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.completed += 1;
        counters.total += elapsed;
        counters.recent.push_back(elapsed);
        if counters.recent.len() > RECENT_WINDOW {
            counters.recent.pop_front();
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.lock();
        let average = if counters.recent.is_empty() {
            Duration::ZERO
        } else {
            counters.recent.iter().sum::<Duration>() / counters.recent.len() as u32
        };

        StatsSnapshot {
            uptime: self.started.elapsed(),
            translations_completed: counters.completed,
            total_translation_time: counters.total,
            average_translation_time: average,
        }
    }
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format an uptime as `1d 2h 3m 4s`, leaving out zero components.
/// Seconds are always shown when nothing else is.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }

    parts.join(" ")
}
