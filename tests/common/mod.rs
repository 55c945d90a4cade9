//! In-memory stand-ins for the external tools.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hypeclip::adapters::{MediaFetcher, Transcoder, TranscriptFetcher, VodSource};
use hypeclip::core::ProgressSink;
use hypeclip::domain::{ChatEvent, ClipWindow, Transcript};
use hypeclip::ToolError;

/// Counts jobs between the start of a fetch and the end of its transcode
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

/// Writes a fake segment for every window, failing on request
pub struct FakeFetcher {
    pub in_flight: Arc<InFlight>,
    pub delay: Duration,
    /// Window starts whose fetch fails after writing a partial file
    pub fail_starts: HashSet<u64>,
    /// Never finish (for timeout and cancellation tests)
    pub hang: bool,
    pub fetched: Mutex<Vec<ClipWindow>>,
}

impl FakeFetcher {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            in_flight,
            delay: Duration::from_millis(20),
            fail_starts: HashSet::new(),
            hang: false,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, start: u64) -> Self {
        self.fail_starts.insert(start);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    fn name(&self) -> &str {
        "fake-fetcher"
    }

    async fn fetch(
        &self,
        _source: &VodSource,
        window: ClipWindow,
        dest: &Path,
    ) -> Result<(), ToolError> {
        self.in_flight.enter();
        self.fetched.lock().unwrap().push(window);

        if self.hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.delay).await;

        tokio::fs::write(dest, window.to_string()).await.unwrap();

        if self.fail_starts.contains(&window.start) {
            self.in_flight.leave();
            return Err(ToolError::Exit {
                tool: "fake-fetcher".to_string(),
                code: 1,
                stderr: "ERROR: fragment not found".to_string(),
            });
        }

        Ok(())
    }
}

/// Copies the fetched segment to the output, failing on request
pub struct FakeTranscoder {
    pub in_flight: Arc<InFlight>,
    /// Segment contents (window text) that fail to transcode
    pub fail_windows: HashSet<String>,
}

impl FakeTranscoder {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            in_flight,
            fail_windows: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, window: ClipWindow) -> Self {
        self.fail_windows.insert(window.to_string());
        self
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake-transcoder"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let content = tokio::fs::read_to_string(input).await.map_err(|e| {
            self.in_flight.leave();
            ToolError::output("fake-transcoder", e.to_string())
        })?;

        if self.fail_windows.contains(&content) {
            self.in_flight.leave();
            return Err(ToolError::output("fake-transcoder", "corrupt input"));
        }

        tokio::fs::write(output, format!("encoded {}", content))
            .await
            .unwrap();
        self.in_flight.leave();
        Ok(())
    }
}

/// Returns a fixed transcript, or fails
pub struct FakeTranscripts {
    pub events: Option<Vec<ChatEvent>>,
    pub requested: Mutex<Vec<(String, ClipWindow)>>,
}

impl FakeTranscripts {
    pub fn with_events(events: Vec<ChatEvent>) -> Self {
        Self {
            events: Some(events),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            events: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TranscriptFetcher for FakeTranscripts {
    fn name(&self) -> &str {
        "fake-transcripts"
    }

    async fn fetch_transcript(
        &self,
        source: &VodSource,
        range: ClipWindow,
    ) -> Result<Transcript, ToolError> {
        self.requested
            .lock()
            .unwrap()
            .push((source.url.clone(), range));

        match &self.events {
            Some(events) => Ok(Transcript::new(events.clone())),
            None => Err(ToolError::Exit {
                tool: "fake-transcripts".to_string(),
                code: 1,
                stderr: "Video not found".to_string(),
            }),
        }
    }
}

/// Records every progress message in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Quiet chat with sharp bursts at the given seconds
pub fn chat_with_bursts(length: u64, bursts: &[u64]) -> Vec<ChatEvent> {
    let mut events: Vec<ChatEvent> = (0..length).map(ChatEvent::new).collect();
    for &second in bursts {
        events.extend(std::iter::repeat(ChatEvent::new(second)).take(20));
    }
    events
}
