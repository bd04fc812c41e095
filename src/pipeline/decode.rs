//! Hardware decode stage: compressed access units in, opaque frames out.
//!
//! Owns the decoder component, both buffer pools and the flow-control gate.
//! Bring-up is split in two so the controller can enable the renderer in
//! between: `configure` creates and negotiates the component, `enable`
//! switches its ports live. The decoder must never produce a frame before
//! the renderer is ready to take it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use log::{info, warn};

use crate::codec::{StreamDimensions, VideoCodec};
use crate::config::PipelineConfig;
use crate::error::DecoderError;
use crate::hw::{
    DecoderComponent, FrameLayout, HwEvent, InputFormat, OutputFormat, Rejected, VideoDriver,
};
use crate::pipeline::gate::FlowControlGate;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::pool::BufferPool;
use crate::session::{AccessUnit, SubmitResult};

pub struct DecodeStage {
    decoder: Box<dyn DecoderComponent>,
    events: Sender<HwEvent>,
    dims: StreamDimensions,
    input_pool: Arc<BufferPool>,
    output_pool: Arc<BufferPool>,
    gate: Arc<FlowControlGate>,
    /// Set by the completion path on a hardware error; cleared here on the
    /// next keyframe.
    degraded: Arc<AtomicBool>,
    health: Arc<PipelineHealth>,
}

impl DecodeStage {
    /// Create the decoder component and negotiate formats and buffers.
    ///
    /// The control port goes live here so asynchronous errors are visible
    /// during the rest of bring-up; data ports stay disabled until
    /// [`enable`](Self::enable).
    pub(crate) fn configure(
        driver: &dyn VideoDriver,
        codec: VideoCodec,
        dims: StreamDimensions,
        config: &PipelineConfig,
        events: Sender<HwEvent>,
        health: Arc<PipelineHealth>,
    ) -> Result<Self, DecoderError> {
        if codec != VideoCodec::H264 {
            return Err(DecoderError::UnsupportedCodec(codec));
        }

        let mut decoder = driver.create_decoder()?;
        decoder.commit_input_format(&InputFormat::interactive(codec, dims))?;
        decoder.commit_output_format(&OutputFormat { layout: FrameLayout::Opaque })?;

        // The hardware's recommendation is a floor, never a ceiling
        let input_hint = decoder.input_buffer_hint();
        let output_hint = decoder.output_buffer_hint();
        let input_count = config.input_buffer_count.max(input_hint.count);
        let input_size = config.max_access_unit_size.max(input_hint.size);
        let output_count = config.output_buffer_count.max(output_hint.count);

        let input_pool = Arc::new(BufferPool::new("decoder-input", input_count, input_size));
        let output_pool = Arc::new(BufferPool::new("decoder-output", output_count, output_hint.size));
        let gate = Arc::new(FlowControlGate::new(input_count));

        decoder.enable_control(events.clone())?;

        info!(
            "DecodeStage: {codec} decoder configured at {dims} \
             ({input_count} input / {output_count} output buffers)"
        );

        Ok(Self {
            decoder,
            events,
            dims,
            input_pool,
            output_pool,
            gate,
            degraded: Arc::new(AtomicBool::new(false)),
            health,
        })
    }

    /// Enable the data ports and the component, then prime the output port
    /// with every free frame buffer.
    pub(crate) fn enable(&mut self) -> Result<(), DecoderError> {
        self.decoder.enable_input(self.events.clone())?;
        self.decoder.enable_output(self.events.clone())?;
        self.decoder.enable()?;
        self.top_up_output();
        Ok(())
    }

    pub fn dimensions(&self) -> StreamDimensions {
        self.dims
    }

    pub(crate) fn input_pool(&self) -> Arc<BufferPool> {
        Arc::clone(&self.input_pool)
    }

    pub(crate) fn output_pool(&self) -> Arc<BufferPool> {
        Arc::clone(&self.output_pool)
    }

    pub(crate) fn gate(&self) -> Arc<FlowControlGate> {
        Arc::clone(&self.gate)
    }

    pub(crate) fn degraded_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.degraded)
    }

    /// Hand one access unit to the decoder.
    ///
    /// Blocks on the gate while every input buffer is in flight; all failure
    /// paths give the permit (and the buffer, once taken) back before
    /// returning.
    pub fn submit(&mut self, unit: AccessUnit<'_>) -> SubmitResult {
        if self.degraded.load(Ordering::Acquire) {
            if unit.is_keyframe() {
                self.degraded.store(false, Ordering::Release);
                info!("DecodeStage: keyframe received, resuming after hardware error");
            } else {
                return SubmitResult::NeedKeyframe;
            }
        }

        let permit = self.gate.acquire();

        let Some(mut buffer) = self.input_pool.acquire() else {
            // The completion path frees the buffer before the permit, so a
            // submitter that got past the gate should always find one
            warn!("DecodeStage: no input buffer despite held permit");
            return SubmitResult::BufferExhausted;
        };

        if !buffer.try_write(unit.data()) {
            warn!(
                "DecodeStage: dropping {} byte access unit (buffer capacity {})",
                unit.len(),
                buffer.capacity()
            );
            self.input_pool.release(buffer);
            return SubmitResult::NeedKeyframe;
        }
        buffer.flags_mut().frame_end = true;
        buffer.flags_mut().keyframe = unit.is_keyframe();

        match self.decoder.send_input(buffer) {
            Ok(()) => {
                permit.commit();
                self.health.record_submit(unit.len(), unit.is_keyframe());
            }
            Err(Rejected(buffer)) => {
                warn!("DecodeStage: input port refused an access unit");
                self.input_pool.release(buffer);
                return SubmitResult::NeedKeyframe;
            }
        }

        self.top_up_output();
        SubmitResult::Ok
    }

    /// Queue every currently-free output buffer on the output port so the
    /// decoder always has somewhere to put the next frame.
    fn top_up_output(&mut self) {
        while let Some(buffer) = self.output_pool.acquire() {
            if let Err(Rejected(buffer)) = self.decoder.send_output(buffer) {
                self.output_pool.release(buffer);
                break;
            }
        }
    }

    /// Disable the ports and drop the component, together with this stage's
    /// event sender.
    pub(crate) fn shutdown(mut self) {
        self.decoder.disable_ports();
        info!("DecodeStage: decoder shut down");
    }
}
