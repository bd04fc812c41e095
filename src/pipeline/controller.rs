//! Pipeline controller
//!
//! Owns the decode → display pipeline and manages its lifecycle: bring-up,
//! steady-state submission, mid-stream reconfiguration and teardown. One
//! controller serves one video stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};

use crate::codec::{StreamDimensions, VideoCodec};
use crate::config::PipelineConfig;
use crate::error::DecoderError;
use crate::hw::{DisplayRegion, HwEvent, VideoDriver};
use crate::pipeline::decode::DecodeStage;
use crate::pipeline::display::DisplaySink;
use crate::pipeline::gate::FlowControlGate;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::monitor::{dimensions_changed, probe_access_unit};
use crate::pipeline::pool::BufferPool;
use crate::pipeline::state::PipelineState;
use crate::session::{AccessUnit, SubmitResult, VideoStreamHandler};

/// Drives one hardware decode-and-display pipeline.
///
/// Submission calls run on the caller's thread; completion events are
/// drained by a dedicated pump thread. The controller survives decoder
/// rebuilds — health metrics and the display region carry across.
pub struct PipelineController {
    driver: Arc<dyn VideoDriver>,
    config: PipelineConfig,
    region: DisplayRegion,
    health: Arc<PipelineHealth>,
    state: PipelineState,
    active: Option<ActivePipeline>,
}

/// Everything that lives and dies with one decoder configuration.
struct ActivePipeline {
    codec: VideoCodec,
    stage: DecodeStage,
    sink: Arc<DisplaySink>,
    pump: JoinHandle<()>,
}

impl PipelineController {
    /// Create a controller for the given hardware driver.
    ///
    /// No hardware is touched until [`start`](Self::start).
    pub fn new(driver: Arc<dyn VideoDriver>, config: PipelineConfig, region: DisplayRegion) -> Self {
        Self {
            driver,
            config,
            region,
            health: Arc::new(PipelineHealth::new()),
            state: PipelineState::Stopped,
            active: None,
        }
    }

    /// Get the pipeline health metrics.
    pub fn health(&self) -> &Arc<PipelineHealth> {
        &self.health
    }

    /// Get the current pipeline state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Dimensions of the stream currently configured, if any.
    pub fn dimensions(&self) -> Option<StreamDimensions> {
        self.active.as_ref().map(|active| active.stage.dimensions())
    }

    /// Bring the pipeline up for the given codec and initial dimensions.
    ///
    /// Starting while running tears the old pipeline down first.
    pub fn start(
        &mut self,
        codec: VideoCodec,
        dims: StreamDimensions,
    ) -> Result<(), DecoderError> {
        if self.active.is_some() {
            warn!("PipelineController: start while running, restarting at {dims}");
            self.stop();
        }
        self.transition(PipelineState::Starting);

        match self.build(codec, dims) {
            Ok(active) => {
                self.active = Some(active);
                self.transition(PipelineState::Running { since: Instant::now() });
                info!("PipelineController: pipeline started ({codec} at {dims})");
                Ok(())
            }
            Err(err) => {
                self.transition(PipelineState::Stopped);
                Err(err)
            }
        }
    }

    /// Hand one access unit to the pipeline.
    ///
    /// Keyframes are probed for parameter sets first; a dimension change
    /// rebuilds the pipeline before the unit is decoded. Blocks while all
    /// input buffers are in flight.
    pub fn submit(&mut self, unit: AccessUnit<'_>) -> SubmitResult {
        let Some(current) = self.dimensions() else {
            self.health.record_keyframe_request();
            return SubmitResult::NeedKeyframe;
        };

        if unit.is_keyframe()
            && let Some(parsed) = probe_access_unit(unit.data())
            && dimensions_changed(current, parsed)
        {
            info!("PipelineController: stream is now {parsed}, rebuilding pipeline");
            if let Err(err) = self.reconfigure(parsed) {
                error!("PipelineController: rebuild at {parsed} failed: {err}");
                self.health.record_keyframe_request();
                return SubmitResult::NeedKeyframe;
            }
        }

        let result = match self.active.as_mut() {
            Some(active) => active.stage.submit(unit),
            None => SubmitResult::NeedKeyframe,
        };
        if result.needs_keyframe() {
            self.health.record_keyframe_request();
        }
        result
    }

    /// Move or resize the video on screen.
    ///
    /// The region is remembered and reapplied whenever the pipeline is
    /// rebuilt. Returns false only when a live renderer refused the update.
    pub fn set_region(&mut self, region: DisplayRegion) -> bool {
        self.region = region;
        match &self.active {
            Some(active) => active.sink.set_region(&region),
            None => true,
        }
    }

    /// Tear the pipeline down, releasing all hardware resources.
    ///
    /// Safe to call at any time; stopping a stopped pipeline does nothing.
    pub fn stop(&mut self) {
        if self.state.is_stopped() && self.active.is_none() {
            return;
        }
        self.transition(PipelineState::Stopped);
        if let Some(active) = self.active.take() {
            teardown(active);
        }
        info!("PipelineController: pipeline stopped");
    }

    /// Construct decoder, renderer and pump for one configuration.
    ///
    /// Bring-up order is fixed: the renderer must be fully live before the
    /// decoder's data ports are, so the first decoded frame always has
    /// somewhere to go.
    fn build(
        &self,
        codec: VideoCodec,
        dims: StreamDimensions,
    ) -> Result<ActivePipeline, DecoderError> {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        let mut stage = DecodeStage::configure(
            self.driver.as_ref(),
            codec,
            dims,
            &self.config,
            events_tx.clone(),
            Arc::clone(&self.health),
        )?;

        let sink = match DisplaySink::configure(
            self.driver.as_ref(),
            dims,
            &self.region,
            events_tx,
            stage.output_pool(),
            Arc::clone(&self.health),
        ) {
            Ok(sink) => Arc::new(sink),
            Err(err) => {
                stage.shutdown();
                return Err(err);
            }
        };

        if let Err(err) = stage.enable() {
            stage.shutdown();
            sink.shutdown();
            return Err(err);
        }

        let pump = spawn_completion_pump(
            events_rx,
            stage.input_pool(),
            stage.output_pool(),
            stage.gate(),
            Arc::clone(&sink),
            stage.degraded_flag(),
            Arc::clone(&self.health),
        );

        Ok(ActivePipeline { codec, stage, sink, pump })
    }

    /// Rebuild the pipeline at new stream dimensions.
    ///
    /// A failed rebuild leaves the pipeline stopped; the next `start` call
    /// recovers.
    fn reconfigure(&mut self, dims: StreamDimensions) -> Result<(), DecoderError> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        let codec = active.codec;
        self.transition(PipelineState::Reconfiguring);
        teardown(active);

        match self.build(codec, dims) {
            Ok(active) => {
                self.active = Some(active);
                self.health.record_reconfigure();
                self.transition(PipelineState::Running { since: Instant::now() });
                info!("PipelineController: pipeline rebuilt at {dims}");
                Ok(())
            }
            Err(err) => {
                self.transition(PipelineState::Stopped);
                Err(err)
            }
        }
    }

    fn transition(&mut self, target: PipelineState) {
        if !self.state.can_transition_to(&target) {
            error!("PipelineController: invalid transition {} -> {}", self.state, target);
            return;
        }
        debug!("PipelineController: {} -> {}", self.state, target);
        self.state = target;
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl VideoStreamHandler for PipelineController {
    fn on_stream_start(
        &mut self,
        codec: VideoCodec,
        dimensions: StreamDimensions,
    ) -> Result<(), DecoderError> {
        self.start(codec, dimensions)
    }

    fn on_access_unit(&mut self, unit: AccessUnit<'_>) -> SubmitResult {
        self.submit(unit)
    }

    fn on_stream_stop(&mut self) {
        self.stop();
    }
}

/// Tear one configuration down in dependency order: decoder first, then
/// renderer, then wait for the pump to drain the channel and exit.
///
/// Dropping the components drops the last event senders, which disconnects
/// the channel; any completions still in flight are drained into the pools
/// on the way out, so no buffer is lost.
fn teardown(active: ActivePipeline) {
    let ActivePipeline { stage, sink, pump, .. } = active;

    stage.shutdown();
    sink.shutdown();
    if pump.join().is_err() {
        error!("PipelineController: completion pump panicked");
    }
}

/// Spawn the thread that turns hardware completion events back into pool
/// and gate capacity. Exits when the event channel disconnects.
fn spawn_completion_pump(
    events: Receiver<HwEvent>,
    input_pool: Arc<BufferPool>,
    output_pool: Arc<BufferPool>,
    gate: Arc<FlowControlGate>,
    sink: Arc<DisplaySink>,
    degraded: Arc<AtomicBool>,
    health: Arc<PipelineHealth>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in events {
            match event {
                HwEvent::InputReturned(buffer) => {
                    // Buffer before permit: a submitter woken by the gate
                    // must find a free buffer waiting
                    input_pool.release(buffer);
                    gate.release();
                }
                HwEvent::FrameDecoded(frame) => sink.present_frame(frame),
                HwEvent::FrameRetired(buffer) => {
                    output_pool.release(buffer);
                }
                HwEvent::ControlError(code) => {
                    error!(
                        "PipelineController: hardware error event {code:#x}, \
                         dropping delta frames until the next keyframe"
                    );
                    health.record_decode_error();
                    degraded.store(true, Ordering::Release);
                }
            }
        }
        debug!("PipelineController: completion pump exited");
    })
}
