//! # Render Session
//!
//! Per-tile render loop around [`FrameFitter`]: one task per slot takes the
//! newest frame, runs it through the slot's [`ProcessingPipeline`] on the
//! blocking pool and hands the result to a [`FrameSink`].
//!
//! Every slot's pipeline starts with a [`FitProcessor`] that asks the slot
//! for its current size and fits the frame to it. Extra stages registered
//! with [`RenderSessionBuilder::stage`] run after it; a stage returning
//! `None` skips the frame.
//!
//! ## Delivery
//!
//! Each slot holds at most one pending frame. Pushing a frame while the slot
//! is still rendering replaces the pending one, so a slow slot shows the
//! latest picture instead of falling behind. Replaced frames are reported as
//! `dropped` in [`SlotStats`].
//!
//! ## Failures
//!
//! Slots never wait on each other. A failed frame is counted and then:
//! - retryable sink errors get one more attempt after the error's delay,
//! - fatal errors ([`classify::is_fatal`]) stop the slot,
//! - anything else skips the frame and the slot carries on.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use slotfit::layout::FixedSlotSize;
//! use slotfit::processing::FrameSink;
//! use slotfit::session::RenderSession;
//! # async fn example(sink: Arc<dyn FrameSink>, frame: slotfit::Frame) -> slotfit::FitResult<()> {
//! let handle = RenderSession::builder()
//!     .slot(0, Arc::new(FixedSlotSize::new(320, 240)))
//!     .sink(sink)
//!     .build()?
//!     .start();
//!
//! handle.feeder(0).expect("slot 0 exists").push(frame)?;
//! let stats = handle.shutdown().await;
//! println!("{:?}", stats[&0]);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::Frame;
use crate::error::{FitError, FitResult, Retryable, classify};
use crate::fit::FrameFitter;
use crate::layout::{GridLayout, SlotSizeProvider};
use crate::processing::{
    FitProcessor, FrameProcessor, FrameSink, ProcessingPipeline, SinkMultiplexer, SlotId,
};

/// Builds one processor instance for a slot.
type StageFactory = Arc<dyn Fn(SlotId) -> Box<dyn FrameProcessor> + Send + Sync>;

/// Frame counters for one slot.
///
/// After [`SessionHandle::shutdown`] every submitted frame is in exactly one
/// of `rendered`, `dropped`, `failed` or `skipped`. While the session runs,
/// the frame currently being rendered is in none of them yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    /// Frames pushed to the slot
    pub submitted: u64,
    /// Frames fitted and presented
    pub rendered: u64,
    /// Frames replaced by a newer one, or still pending at shutdown
    pub dropped: u64,
    /// Frames that failed to fit or present
    pub failed: u64,
    /// Frames a pipeline stage chose not to present
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct SlotCounters {
    submitted: AtomicU64,
    rendered: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl SlotCounters {
    fn snapshot(&self) -> SlotStats {
        SlotStats {
            submitted: self.submitted.load(Ordering::Acquire),
            rendered: self.rendered.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::AcqRel);
    }
}

/// Configured but not yet running session.
pub struct RenderSession {
    fitter: FrameFitter,
    slots: BTreeMap<SlotId, Arc<dyn SlotSizeProvider>>,
    stages: Vec<StageFactory>,
    sink: Arc<dyn FrameSink>,
}

impl RenderSession {
    /// Create a new render session using the builder pattern.
    pub fn builder() -> RenderSessionBuilder {
        RenderSessionBuilder::new()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Spawn one render task per slot. Must be called from within a Tokio runtime.
    pub fn start(self) -> SessionHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut feeders = BTreeMap::new();
        let mut tasks = Vec::with_capacity(self.slots.len());

        info!(
            slots = self.slots.len(),
            stages = self.stages.len(),
            "render session started"
        );

        for (slot, provider) in self.slots {
            let (tx, rx) = watch::channel(None);
            let pending = Arc::new(tx);
            let counters = Arc::new(SlotCounters::default());
            feeders.insert(
                slot,
                SlotFeeder {
                    slot,
                    tx: Arc::clone(&pending),
                    counters: Arc::clone(&counters),
                },
            );
            let worker = SlotWorker {
                slot,
                fitter: self.fitter,
                provider,
                stages: self.stages.clone(),
                sink: Arc::clone(&self.sink),
                pending,
                counters,
            };
            tasks.push((slot, tokio::spawn(worker.run(rx, shutdown_rx.clone()))));
        }

        SessionHandle {
            feeders,
            shutdown: shutdown_tx,
            tasks,
        }
    }
}

/// Builder for render sessions.
pub struct RenderSessionBuilder {
    fitter: FrameFitter,
    slots: BTreeMap<SlotId, Arc<dyn SlotSizeProvider>>,
    stages: Vec<StageFactory>,
    sinks: Vec<Arc<dyn FrameSink>>,
}

impl Default for RenderSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSessionBuilder {
    pub fn new() -> Self {
        Self {
            fitter: FrameFitter::default(),
            slots: BTreeMap::new(),
            stages: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Fitter shared by all slots (it is `Copy`; each task gets its own).
    pub fn fitter(mut self, fitter: FrameFitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// Add or replace a slot.
    pub fn slot(mut self, slot: SlotId, provider: Arc<dyn SlotSizeProvider>) -> Self {
        self.slots.insert(slot, provider);
        self
    }

    /// Add slots `0..feeds` sized by a grid layout.
    pub fn grid(mut self, layout: &GridLayout, feeds: usize) -> Self {
        for rect in layout.slot_rects(feeds) {
            self.slots.insert(rect.index, Arc::new(rect.as_provider()));
        }
        self
    }

    /// Append a processing stage after fitting. `factory` is called once
    /// per slot, so stages may keep per-slot state.
    pub fn stage<P, F>(mut self, factory: F) -> Self
    where
        P: FrameProcessor + 'static,
        F: Fn(SlotId) -> P + Send + Sync + 'static,
    {
        self.stages
            .push(Arc::new(move |slot| Box::new(factory(slot)) as Box<dyn FrameProcessor>));
        self
    }

    /// Add a sink. With several sinks every frame is presented on all of them.
    pub fn sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn build(mut self) -> FitResult<RenderSession> {
        let sink: Arc<dyn FrameSink> = match self.sinks.len() {
            0 => return Err(FitError::config("sink", "none", "a frame sink is required")),
            1 => self.sinks.remove(0),
            _ => Arc::new(
                self.sinks
                    .into_iter()
                    .fold(SinkMultiplexer::new(), SinkMultiplexer::with_sink),
            ),
        };
        if self.slots.is_empty() {
            return Err(FitError::config("slots", 0, "at least one slot is required"));
        }
        Ok(RenderSession {
            fitter: self.fitter,
            slots: self.slots,
            stages: self.stages,
            sink,
        })
    }
}

/// Producer side of one slot. Cheap to clone; hand one to each frame source.
#[derive(Clone)]
pub struct SlotFeeder {
    slot: SlotId,
    tx: Arc<watch::Sender<Option<Frame>>>,
    counters: Arc<SlotCounters>,
}

impl SlotFeeder {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Queue `frame` for rendering, replacing any frame still pending.
    pub fn push(&self, frame: Frame) -> FitResult<()> {
        if self.tx.is_closed() {
            return Err(FitError::SlotClosed { slot: self.slot });
        }
        let mut replaced = false;
        self.tx
            .send_modify(|pending| replaced = pending.replace(frame).is_some());
        SlotCounters::bump(&self.counters.submitted);
        if replaced {
            SlotCounters::bump(&self.counters.dropped);
        }
        Ok(())
    }
}

/// Running session.
pub struct SessionHandle {
    feeders: BTreeMap<SlotId, SlotFeeder>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<(SlotId, JoinHandle<()>)>,
}

impl SessionHandle {
    pub fn feeder(&self, slot: SlotId) -> Option<SlotFeeder> {
        self.feeders.get(&slot).cloned()
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.feeders.keys().copied()
    }

    /// Current counters without stopping.
    pub fn stats(&self) -> BTreeMap<SlotId, SlotStats> {
        self.feeders
            .iter()
            .map(|(slot, feeder)| (*slot, feeder.counters.snapshot()))
            .collect()
    }

    /// Stop every slot and wait for its task. Pending frames are not
    /// rendered; they are counted as dropped.
    pub async fn shutdown(self) -> BTreeMap<SlotId, SlotStats> {
        // Only fails when every task already exited.
        let _ = self.shutdown.send(true);

        let (slots, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        for (slot, result) in slots.into_iter().zip(join_all(handles).await) {
            if let Err(err) = result {
                warn!(slot, error = %err, "render task ended abnormally");
            }
        }

        let stats: BTreeMap<_, _> = self
            .feeders
            .iter()
            .map(|(slot, feeder)| (*slot, feeder.counters.snapshot()))
            .collect();
        for (slot, s) in &stats {
            debug!(
                slot,
                submitted = s.submitted,
                rendered = s.rendered,
                dropped = s.dropped,
                failed = s.failed,
                skipped = s.skipped,
                "slot stopped"
            );
        }
        info!(slots = stats.len(), "render session stopped");
        stats
    }
}

struct SlotWorker {
    slot: SlotId,
    fitter: FrameFitter,
    provider: Arc<dyn SlotSizeProvider>,
    stages: Vec<StageFactory>,
    sink: Arc<dyn FrameSink>,
    pending: Arc<watch::Sender<Option<Frame>>>,
    counters: Arc<SlotCounters>,
}

impl SlotWorker {
    fn pipeline(&self) -> ProcessingPipeline {
        let mut pipeline = ProcessingPipeline::new()
            .with_processor(FitProcessor::new(self.fitter, Arc::clone(&self.provider)));
        for stage in &self.stages {
            pipeline.push(stage(self.slot));
        }
        pipeline
    }

    /// Take the pending frame without waking the receiver.
    fn take_pending(&self) -> Option<Frame> {
        let mut taken = None;
        self.pending.send_if_modified(|pending| {
            taken = pending.take();
            false
        });
        taken
    }

    async fn run(
        self,
        mut frames: watch::Receiver<Option<Frame>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut pipeline = self.pipeline();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                changed = frames.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            drop(frames.borrow_and_update());
            let Some(frame) = self.take_pending() else {
                continue;
            };

            let job = tokio::task::spawn_blocking(move || {
                let result = pipeline.process_frame(frame);
                (pipeline, result)
            });
            let result = match job.await {
                Ok((returned, result)) => {
                    pipeline = returned;
                    result
                }
                Err(err) => {
                    pipeline = self.pipeline();
                    warn!(slot = self.slot, error = %err, "processing task failed");
                    SlotCounters::bump(&self.counters.failed);
                    continue;
                }
            };

            let fitted = match result {
                Ok(Some(fitted)) => fitted,
                Ok(None) => {
                    debug!(slot = self.slot, "frame skipped by pipeline");
                    SlotCounters::bump(&self.counters.skipped);
                    continue;
                }
                Err(err) => {
                    if self.record_failure(&err) {
                        break;
                    }
                    continue;
                }
            };

            match self.present(fitted).await {
                Ok(()) => SlotCounters::bump(&self.counters.rendered),
                Err(err) => {
                    if self.record_failure(&err) {
                        break;
                    }
                }
            }
        }

        drop(frames);
        if self.take_pending().is_some() {
            SlotCounters::bump(&self.counters.dropped);
        }
    }

    /// Present `frame`, retrying once when the sink reports a retryable error.
    async fn present(&self, frame: Frame) -> FitResult<()> {
        match self.sink.present(self.slot, frame.clone()).await {
            Err(err) if err.is_retryable() => {
                let delay = err.retry_delay_ms().unwrap_or(0);
                debug!(slot = self.slot, error = %err, delay_ms = delay, "retrying presentation");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                self.sink.present(self.slot, frame).await
            }
            other => other,
        }
    }

    /// Count a failed frame. Returns true when the slot must stop.
    fn record_failure(&self, err: &FitError) -> bool {
        SlotCounters::bump(&self.counters.failed);
        if classify::is_fatal(err) {
            error!(slot = self.slot, error = %err, category = err.category(), "stopping slot");
            return true;
        }
        if classify::is_frame_local(err) {
            warn!(slot = self.slot, error = %err, category = err.category(), "skipping frame");
        } else {
            warn!(slot = self.slot, error = %err, category = err.category(), "frame not presented");
        }
        false
    }
}
