//! Scripted in-memory hardware driver for tests.
//!
//! Records every call in a journal, injects one-shot failures at named
//! operations, and delivers completion events either immediately (the
//! default) or on demand, so tests can freeze the hardware mid-flight and
//! step it manually.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::Sender;

use crate::error::HwError;
use crate::hw::buffer::HwBuffer;
use crate::hw::component::{
    BufferHint, DecoderComponent, DisplayRegion, HwEvent, InputFormat, OutputFormat, Rejected,
    RenderFormat, RendererComponent, VideoDriver,
};

#[derive(Clone)]
pub(crate) struct MockDriver {
    inner: Arc<MockInner>,
}

struct MockInner {
    journal: Mutex<Vec<String>>,
    fail_once: Mutex<HashSet<String>>,
    /// Deliver `InputReturned` synchronously from `send_input`.
    auto_complete_input: AtomicBool,
    /// Pair each input with a queued output buffer and emit `FrameDecoded`.
    auto_decode: AtomicBool,
    /// Deliver `FrameRetired` synchronously from the renderer's `send_input`.
    auto_present: AtomicBool,
    input_hint: Mutex<BufferHint>,
    output_hint: Mutex<BufferHint>,
    epoch: AtomicU64,
    decoder_ctl: Mutex<Option<DecoderCtl>>,
}

/// Handle onto the live decoder so tests can drive completions manually.
struct DecoderCtl {
    epoch: u64,
    events: Sender<HwEvent>,
    held_inputs: Arc<Mutex<VecDeque<HwBuffer>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockInner {
                journal: Mutex::new(Vec::new()),
                fail_once: Mutex::new(HashSet::new()),
                auto_complete_input: AtomicBool::new(true),
                auto_decode: AtomicBool::new(false),
                auto_present: AtomicBool::new(true),
                input_hint: Mutex::new(BufferHint { count: 1, size: 0 }),
                output_hint: Mutex::new(BufferHint { count: 3, size: 256 }),
                epoch: AtomicU64::new(0),
                decoder_ctl: Mutex::new(None),
            }),
        }
    }

    /// Stop auto-completing input buffers; they pile up until
    /// [`complete_one_input`](Self::complete_one_input).
    pub fn hold_input_completions(&self) {
        self.inner.auto_complete_input.store(false, Ordering::SeqCst);
    }

    /// Make the decoder emit one `FrameDecoded` per input.
    pub fn enable_auto_decode(&self) {
        self.inner.auto_decode.store(true, Ordering::SeqCst);
    }

    /// Keep decoded frames inside the renderer instead of retiring them.
    pub fn hold_presented_frames(&self) {
        self.inner.auto_present.store(false, Ordering::SeqCst);
    }

    pub fn set_output_hint(&self, hint: BufferHint) {
        *self.inner.output_hint.lock().unwrap() = hint;
    }

    /// Fail the next call to `op` (journal entry name) with an error or a
    /// rejected hand-off, depending on the operation.
    pub fn fail_once(&self, op: &str) {
        self.inner.fail_once.lock().unwrap().insert(op.to_string());
    }

    pub fn journal(&self) -> Vec<String> {
        self.inner.journal.lock().unwrap().clone()
    }

    pub fn journal_count(&self, prefix: &str) -> usize {
        self.inner
            .journal
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    pub fn held_input_count(&self) -> usize {
        match self.inner.decoder_ctl.lock().unwrap().as_ref() {
            Some(ctl) => ctl.held_inputs.lock().unwrap().len(),
            None => 0,
        }
    }

    /// Deliver the oldest held input completion. Returns false when there is
    /// nothing to deliver.
    pub fn complete_one_input(&self) -> bool {
        let ctl = self.inner.decoder_ctl.lock().unwrap();
        let Some(ctl) = ctl.as_ref() else {
            return false;
        };
        let Some(buffer) = ctl.held_inputs.lock().unwrap().pop_front() else {
            return false;
        };
        ctl.events.send(HwEvent::InputReturned(buffer)).is_ok()
    }

    /// Raise an asynchronous hardware error on the live decoder.
    pub fn emit_control_error(&self, code: u32) -> bool {
        let ctl = self.inner.decoder_ctl.lock().unwrap();
        match ctl.as_ref() {
            Some(ctl) => ctl.events.send(HwEvent::ControlError(code)).is_ok(),
            None => false,
        }
    }

    fn log(&self, entry: String) {
        self.inner.journal.lock().unwrap().push(entry);
    }

    fn take_failure(&self, op: &str) -> bool {
        self.inner.fail_once.lock().unwrap().remove(op)
    }
}

impl VideoDriver for MockDriver {
    fn create_decoder(&self) -> Result<Box<dyn DecoderComponent>, HwError> {
        self.log("decoder.create".into());
        if self.take_failure("decoder.create") {
            return Err(HwError::ComponentCreate("mock decoder".into()));
        }
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockDecoder {
            inner: Arc::clone(&self.inner),
            epoch,
            events_control: None,
            events_input: None,
            events_output: None,
            held_inputs: Arc::new(Mutex::new(VecDeque::new())),
            queued_outputs: VecDeque::new(),
            pending_frames: 0,
        }))
    }

    fn create_renderer(&self) -> Result<Box<dyn RendererComponent>, HwError> {
        self.log("renderer.create".into());
        if self.take_failure("renderer.create") {
            return Err(HwError::ComponentCreate("mock renderer".into()));
        }
        Ok(Box::new(MockRenderer {
            inner: Arc::clone(&self.inner),
            events_control: None,
            events_input: None,
            held_frames: VecDeque::new(),
        }))
    }
}

struct MockDecoder {
    inner: Arc<MockInner>,
    epoch: u64,
    events_control: Option<Sender<HwEvent>>,
    events_input: Option<Sender<HwEvent>>,
    events_output: Option<Sender<HwEvent>>,
    held_inputs: Arc<Mutex<VecDeque<HwBuffer>>>,
    queued_outputs: VecDeque<HwBuffer>,
    pending_frames: usize,
}

impl MockDecoder {
    fn driver(&self) -> MockDriver {
        MockDriver { inner: Arc::clone(&self.inner) }
    }
}

impl DecoderComponent for MockDecoder {
    fn commit_input_format(&mut self, format: &InputFormat) -> Result<(), HwError> {
        self.driver().log(format!(
            "decoder.input_format {} coded {} crop {}",
            format.codec, format.coded, format.crop
        ));
        if self.driver().take_failure("decoder.input_format") {
            return Err(HwError::FormatRejected { port: "input", reason: "mock".into() });
        }
        Ok(())
    }

    fn commit_output_format(&mut self, _format: &OutputFormat) -> Result<(), HwError> {
        self.driver().log("decoder.output_format opaque".into());
        if self.driver().take_failure("decoder.output_format") {
            return Err(HwError::FormatRejected { port: "output", reason: "mock".into() });
        }
        Ok(())
    }

    fn input_buffer_hint(&self) -> BufferHint {
        *self.inner.input_hint.lock().unwrap()
    }

    fn output_buffer_hint(&self) -> BufferHint {
        *self.inner.output_hint.lock().unwrap()
    }

    fn enable_control(&mut self, events: Sender<HwEvent>) -> Result<(), HwError> {
        self.driver().log("decoder.enable_control".into());
        if self.driver().take_failure("decoder.enable_control") {
            return Err(HwError::EnableFailed("decoder control".into()));
        }
        self.events_control = Some(events);
        Ok(())
    }

    fn enable_input(&mut self, events: Sender<HwEvent>) -> Result<(), HwError> {
        self.driver().log("decoder.enable_input".into());
        if self.driver().take_failure("decoder.enable_input") {
            return Err(HwError::EnableFailed("decoder input".into()));
        }
        *self.inner.decoder_ctl.lock().unwrap() = Some(DecoderCtl {
            epoch: self.epoch,
            events: events.clone(),
            held_inputs: Arc::clone(&self.held_inputs),
        });
        self.events_input = Some(events);
        Ok(())
    }

    fn enable_output(&mut self, events: Sender<HwEvent>) -> Result<(), HwError> {
        self.driver().log("decoder.enable_output".into());
        if self.driver().take_failure("decoder.enable_output") {
            return Err(HwError::EnableFailed("decoder output".into()));
        }
        self.events_output = Some(events);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), HwError> {
        self.driver().log("decoder.enable".into());
        if self.driver().take_failure("decoder.enable") {
            return Err(HwError::EnableFailed("decoder component".into()));
        }
        Ok(())
    }

    fn send_input(&mut self, buffer: HwBuffer) -> Result<(), Rejected> {
        self.driver()
            .log(format!("decoder.send_input keyframe={}", buffer.flags().keyframe));
        if self.driver().take_failure("decoder.send_input") {
            return Err(Rejected(buffer));
        }

        if self.inner.auto_complete_input.load(Ordering::SeqCst) {
            if let Some(events) = &self.events_input {
                let _ = events.send(HwEvent::InputReturned(buffer));
            }
        } else {
            self.held_inputs.lock().unwrap().push_back(buffer);
        }

        if self.inner.auto_decode.load(Ordering::SeqCst) {
            match self.queued_outputs.pop_front() {
                Some(mut frame) => {
                    frame.flags_mut().frame_end = true;
                    if let Some(events) = &self.events_output {
                        let _ = events.send(HwEvent::FrameDecoded(frame));
                    }
                }
                None => self.pending_frames += 1,
            }
        }

        Ok(())
    }

    fn send_output(&mut self, buffer: HwBuffer) -> Result<(), Rejected> {
        self.driver().log("decoder.send_output".into());
        if self.driver().take_failure("decoder.send_output") {
            return Err(Rejected(buffer));
        }

        if self.pending_frames > 0 && self.inner.auto_decode.load(Ordering::SeqCst) {
            self.pending_frames -= 1;
            let mut frame = buffer;
            frame.flags_mut().frame_end = true;
            if let Some(events) = &self.events_output {
                let _ = events.send(HwEvent::FrameDecoded(frame));
            }
        } else {
            self.queued_outputs.push_back(buffer);
        }
        Ok(())
    }

    fn disable_ports(&mut self) {
        self.driver().log("decoder.disable_ports".into());
        self.events_control = None;
        self.events_input = None;
        self.events_output = None;
    }
}

impl Drop for MockDecoder {
    fn drop(&mut self) {
        let mut ctl = self.inner.decoder_ctl.lock().unwrap();
        if ctl.as_ref().is_some_and(|c| c.epoch == self.epoch) {
            *ctl = None;
        }
    }
}

struct MockRenderer {
    inner: Arc<MockInner>,
    events_control: Option<Sender<HwEvent>>,
    events_input: Option<Sender<HwEvent>>,
    held_frames: VecDeque<HwBuffer>,
}

impl MockRenderer {
    fn driver(&self) -> MockDriver {
        MockDriver { inner: Arc::clone(&self.inner) }
    }
}

impl RendererComponent for MockRenderer {
    fn commit_input_format(&mut self, format: &RenderFormat) -> Result<(), HwError> {
        self.driver().log(format!("renderer.input_format {}", format.dims));
        if self.driver().take_failure("renderer.input_format") {
            return Err(HwError::FormatRejected { port: "input", reason: "mock".into() });
        }
        Ok(())
    }

    fn set_display_region(&mut self, region: &DisplayRegion) -> Result<(), HwError> {
        let entry = if region.fullscreen {
            format!("renderer.region fullscreen layer {}", region.layer)
        } else {
            format!(
                "renderer.region {},{} {}x{} layer {}",
                region.dest.x, region.dest.y, region.dest.width, region.dest.height, region.layer
            )
        };
        self.driver().log(entry);
        if self.driver().take_failure("renderer.region") {
            return Err(HwError::ParameterRejected("display region".into()));
        }
        Ok(())
    }

    fn enable_control(&mut self, events: Sender<HwEvent>) -> Result<(), HwError> {
        self.driver().log("renderer.enable_control".into());
        if self.driver().take_failure("renderer.enable_control") {
            return Err(HwError::EnableFailed("renderer control".into()));
        }
        self.events_control = Some(events);
        Ok(())
    }

    fn enable_input(&mut self, events: Sender<HwEvent>) -> Result<(), HwError> {
        self.driver().log("renderer.enable_input".into());
        if self.driver().take_failure("renderer.enable_input") {
            return Err(HwError::EnableFailed("renderer input".into()));
        }
        self.events_input = Some(events);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), HwError> {
        self.driver().log("renderer.enable".into());
        if self.driver().take_failure("renderer.enable") {
            return Err(HwError::EnableFailed("renderer component".into()));
        }
        Ok(())
    }

    fn send_input(&mut self, buffer: HwBuffer) -> Result<(), Rejected> {
        self.driver().log("renderer.send_input".into());
        if self.driver().take_failure("renderer.send_input") {
            return Err(Rejected(buffer));
        }

        if self.inner.auto_present.load(Ordering::SeqCst) {
            if let Some(events) = &self.events_input {
                let _ = events.send(HwEvent::FrameRetired(buffer));
            }
        } else {
            self.held_frames.push_back(buffer);
        }
        Ok(())
    }

    fn disable_ports(&mut self) {
        self.driver().log("renderer.disable_ports".into());
        self.events_control = None;
        self.events_input = None;
    }
}
