//! # Frame Processing Pipeline
//!
//! Per-tile processing between frame delivery and presentation.
//!
//! ## Architecture
//!
//! 1. **FrameProcessor Trait**: one synchronous step on one frame
//! 2. **FitProcessor**: queries its slot size and fits the frame to it
//! 3. **ProcessingPipeline**: ordered processor chain
//! 4. **FrameSink Trait**: the presentation layer receiving fitted frames
//! 5. **SinkMultiplexer**: hands one fitted frame to several sinks at once
//!
//! Frames carry `Arc<Vec<u8>>` pixel data, so handing a frame to several
//! sinks only bumps a reference count.

use std::sync::Arc;

use async_trait::async_trait;
use fast_image_resize::Resizer;
use futures_util::future::join_all;

use crate::core::Frame;
use crate::error::FitResult;
use crate::fit::{FrameFitter, SlotTarget};
use crate::layout::SlotSizeProvider;

/// Index of a slot in the grid.
pub type SlotId = usize;

/// Abstract frame processing interface.
/// Implement this trait to add steps before or after fitting.
pub trait FrameProcessor: Send {
    /// Process a single frame.
    ///
    /// # Returns
    /// Processed frame, or `None` to skip this frame
    fn process_frame(&mut self, frame: Frame) -> FitResult<Option<Frame>>;
}

/// Fits each frame to the size its slot reports at that moment.
pub struct FitProcessor {
    fitter: FrameFitter,
    provider: Arc<dyn SlotSizeProvider>,
    resizer: Resizer,
    last_target: Option<SlotTarget>,
}

impl FitProcessor {
    pub fn new(fitter: FrameFitter, provider: Arc<dyn SlotSizeProvider>) -> Self {
        Self {
            fitter,
            provider,
            resizer: Resizer::new(),
            last_target: None,
        }
    }

    /// Target used for the most recent frame.
    pub fn last_target(&self) -> Option<SlotTarget> {
        self.last_target
    }
}

impl FrameProcessor for FitProcessor {
    fn process_frame(&mut self, frame: Frame) -> FitResult<Option<Frame>> {
        let (width, height) = self.provider.current_size();
        self.last_target = Some(self.fitter.resolve_target(width, height));
        let fitted = self.fitter.fit_with(&mut self.resizer, &frame, width, height)?;
        Ok(Some(fitted))
    }
}

/// Composable processing pipeline.
/// Chains multiple processors together for sequential frame processing.
#[derive(Default)]
pub struct ProcessingPipeline {
    processors: Vec<Box<dyn FrameProcessor>>,
}

impl ProcessingPipeline {
    /// Create a new processing pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processor<P: FrameProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn push(&mut self, processor: Box<dyn FrameProcessor>) {
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Process a frame through the entire pipeline.
    /// A stage returning `None` drops the frame; later stages do not run.
    pub fn process_frame(&mut self, frame: Frame) -> FitResult<Option<Frame>> {
        let mut current = frame;
        for processor in &mut self.processors {
            match processor.process_frame(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Abstract presentation interface.
/// Receives frames already sized to their slot.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Display `frame` in `slot`.
    async fn present(&self, slot: SlotId, frame: Frame) -> FitResult<()>;
}

/// Presents each frame on several sinks concurrently.
#[derive(Default)]
pub struct SinkMultiplexer {
    sinks: Vec<Arc<dyn FrameSink>>,
}

impl SinkMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Get the number of sinks in the multiplexer.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

#[async_trait]
impl FrameSink for SinkMultiplexer {
    async fn present(&self, slot: SlotId, frame: Frame) -> FitResult<()> {
        let sends = self
            .sinks
            .iter()
            .map(|sink| sink.present(slot, frame.clone()));
        for result in join_all(sends).await {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PixelLayout;
    use crate::layout::{FixedSlotSize, SharedSlotSize};
    use std::sync::Mutex;

    struct DropOdd;

    impl FrameProcessor for DropOdd {
        fn process_frame(&mut self, frame: Frame) -> FitResult<Option<Frame>> {
            Ok(frame.pts_ns.filter(|pts| pts % 2 == 0).map(|_| frame))
        }
    }

    fn frame(pts: u64) -> Frame {
        Frame::solid(160, 90, PixelLayout::Rgb8, &[9, 9, 9])
            .unwrap()
            .with_pts(pts)
    }

    #[test]
    fn fit_processor_reads_provider_each_frame() {
        let size = Arc::new(SharedSlotSize::new());
        let mut processor = FitProcessor::new(FrameFitter::new(), size.clone());

        let out = processor.process_frame(frame(0)).unwrap().unwrap();
        assert_eq!((out.width, out.height), (400, 300));
        assert!(processor.last_target().unwrap().fallback_applied);

        size.set(120, 120);
        let out = processor.process_frame(frame(1)).unwrap().unwrap();
        assert_eq!((out.width, out.height), (120, 120));
        assert!(!processor.last_target().unwrap().fallback_applied);
    }

    #[test]
    fn pipeline_stops_on_skipped_frame() {
        let mut pipeline = ProcessingPipeline::new()
            .with_processor(DropOdd)
            .with_processor(FitProcessor::new(
                FrameFitter::new(),
                Arc::new(FixedSlotSize::new(32, 32)),
            ));
        assert_eq!(pipeline.len(), 2);

        assert!(pipeline.process_frame(frame(1)).unwrap().is_none());
        let out = pipeline.process_frame(frame(2)).unwrap().unwrap();
        assert_eq!((out.width, out.height), (32, 32));
        assert_eq!(out.pts_ns, Some(2));
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(SlotId, u32, u32)>>,
    }

    #[async_trait]
    impl FrameSink for Recorder {
        async fn present(&self, slot: SlotId, frame: Frame) -> FitResult<()> {
            self.seen.lock().unwrap().push((slot, frame.width, frame.height));
            Ok(())
        }
    }

    #[tokio::test]
    async fn multiplexer_reaches_every_sink() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let mux = SinkMultiplexer::new().with_sink(a.clone()).with_sink(b.clone());
        assert_eq!(mux.sink_count(), 2);

        mux.present(3, frame(0)).await.unwrap();
        assert_eq!(*a.seen.lock().unwrap(), vec![(3, 160, 90)]);
        assert_eq!(*b.seen.lock().unwrap(), vec![(3, 160, 90)]);
    }
}
