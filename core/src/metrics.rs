use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    Matched,
    NoMatch,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Default)]
struct PredictionCounters {
    total_notes: u64,
    matched: u64,
    no_match: u64,
    rejected: u64,
    failed: u64,
    latencies: VecDeque<u64>, // microseconds
}

#[derive(Clone)]
pub struct MetricsCollector {
    state: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    counters: PredictionCounters,
    max_history: usize,
}

impl MetricsCollector {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                counters: PredictionCounters::default(),
                max_history: max_history.max(1),
            })),
        }
    }

    // Counters stay usable after a panicking writer; the data is plain integers.
    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, outcome: PredictionOutcome, latency_us: u64) {
        let mut state = self.lock();
        let max_history = state.max_history;
        let counters = &mut state.counters;
        counters.total_notes += 1;
        match outcome {
            PredictionOutcome::Matched => counters.matched += 1,
            PredictionOutcome::NoMatch => counters.no_match += 1,
            PredictionOutcome::Rejected => counters.rejected += 1,
            PredictionOutcome::Failed => counters.failed += 1,
        }
        counters.latencies.push_back(latency_us);
        if counters.latencies.len() > max_history {
            counters.latencies.pop_front();
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let c = &state.counters;

        let mut sorted_latencies: Vec<u64> = c.latencies.iter().copied().collect();
        sorted_latencies.sort_unstable();

        let attempted = c.matched + c.no_match;
        let match_rate = if attempted > 0 {
            c.matched as f32 / attempted as f32
        } else {
            0.0
        };

        MetricsSnapshot {
            total_notes: c.total_notes,
            matched: c.matched,
            no_match: c.no_match,
            rejected: c.rejected,
            failed: c.failed,
            match_rate,
            p50: percentile(&sorted_latencies, 50.0),
            p95: percentile(&sorted_latencies, 95.0),
            p99: percentile(&sorted_latencies, 99.0),
            history_count: c.latencies.len(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn percentile(sorted: &[u64], p: f32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f32)).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_notes: u64,
    pub matched: u64,
    pub no_match: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Share of matched notes among those that reached the matcher.
    pub match_rate: f32,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub history_count: usize,
}
