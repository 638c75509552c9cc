//! Test utilities shared by unit and integration tests
//!
//! - [`ScriptedSource`]: archive that replays queued responses per tag, or
//!   serves a fixed series clipped to the requested window
//! - [`RecordingSleeper`]: sleeper that records delays instead of blocking

use crate::errors::SourceError;
use crate::fetcher::{ArchiveSource, Sleeper};
use crate::types::{Sample, TimeWindow};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Response = Result<Vec<Sample>, SourceError>;

/// Sample with a value
pub fn sample(timestamp_ms: i64, value: f64) -> Sample {
    Sample::new(timestamp_ms, Some(value))
}

/// Sample the archive reported without a value
pub fn missing(timestamp_ms: i64) -> Sample {
    Sample::new(timestamp_ms, None)
}

/// Deterministic in-memory archive
///
/// A failure pinned to a (tag, window start) pair answers every matching query.
/// Otherwise queued responses for a tag are consumed first, one per query. Once
/// a tag's queue is empty, a registered series answers with its samples inside
/// the window; a tag with neither answers `SourceError::Recoverable`.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Response>>>,
    series: HashMap<String, Vec<Sample>>,
    window_failures: HashMap<(String, i64), SourceError>,
    calls: Mutex<Vec<(String, TimeWindow)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `tag_id`
    pub fn respond(self, tag_id: &str, response: Response) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts
                .entry(tag_id.to_string())
                .or_default()
                .push_back(response);
        }
        self
    }

    /// Serve `samples` for `tag_id`, clipped to each queried window
    pub fn with_series(mut self, tag_id: &str, samples: Vec<Sample>) -> Self {
        self.series.insert(tag_id.to_string(), samples);
        self
    }

    /// Fail every query for `tag_id` whose window starts at `start_ms`
    pub fn fail_window(mut self, tag_id: &str, start_ms: i64, error: SourceError) -> Self {
        self.window_failures.insert((tag_id.to_string(), start_ms), error);
        self
    }

    /// Every query made so far, in call order
    pub fn calls(&self) -> Vec<(String, TimeWindow)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, tag_id: &str) -> usize {
        self.calls().iter().filter(|(t, _)| t == tag_id).count()
    }
}

impl ArchiveSource for ScriptedSource {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((tag_id.to_string(), *window));
        }

        let key = (tag_id.to_string(), window.start_ms);
        if let Some(error) = self.window_failures.get(&key) {
            return Err(error.clone());
        }

        let queued = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut s| s.get_mut(tag_id).and_then(VecDeque::pop_front));
        if let Some(response) = queued {
            return response;
        }

        match self.series.get(tag_id) {
            Some(samples) => Ok(samples
                .iter()
                .filter(|s| (window.start_ms..=window.end_ms).contains(&s.timestamp_ms))
                .copied()
                .collect()),
            None => Err(SourceError::recoverable(format!(
                "no scripted response for '{tag_id}'"
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Records requested delays without sleeping
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}
