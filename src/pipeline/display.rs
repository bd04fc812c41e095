//! Display sink: decoded frames onto the screen.
//!
//! Owns the renderer hardware component. Frames arrive from the completion
//! pump and are handed straight to the renderer's input port; geometry can
//! be changed at any time without touching the decode side.

use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use log::{info, warn};

use crate::codec::StreamDimensions;
use crate::error::DecoderError;
use crate::hw::{
    DisplayRegion, FrameLayout, HwBuffer, HwEvent, Rejected, RenderFormat, RendererComponent,
    VideoDriver,
};
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::pool::BufferPool;

pub struct DisplaySink {
    renderer: Mutex<Option<Box<dyn RendererComponent>>>,
    /// Pool the frame buffers belong to; refused or late frames go back here.
    origin: Arc<BufferPool>,
    health: Arc<PipelineHealth>,
}

impl DisplaySink {
    /// Bring the renderer fully live: format, geometry, ports, component.
    pub(crate) fn configure(
        driver: &dyn VideoDriver,
        dims: StreamDimensions,
        region: &DisplayRegion,
        events: Sender<HwEvent>,
        origin: Arc<BufferPool>,
        health: Arc<PipelineHealth>,
    ) -> Result<Self, DecoderError> {
        let mut renderer = driver.create_renderer()?;
        renderer.commit_input_format(&RenderFormat { layout: FrameLayout::Opaque, dims })?;
        renderer.set_display_region(region)?;
        renderer.enable_control(events.clone())?;
        renderer.enable_input(events)?;
        renderer.enable()?;

        info!("DisplaySink: renderer live at {dims}");

        Ok(Self { renderer: Mutex::new(Some(renderer)), origin, health })
    }

    /// Hand a decoded frame to the renderer. Never blocks.
    ///
    /// A refused hand-off drops the frame and returns its buffer to the
    /// origin pool; a frame arriving after shutdown is released quietly.
    pub fn present_frame(&self, frame: HwBuffer) {
        let mut give_back = None;
        {
            let mut renderer = self.renderer.lock().unwrap();
            match renderer.as_mut() {
                Some(renderer) => match renderer.send_input(frame) {
                    Ok(()) => self.health.record_presented(),
                    Err(Rejected(frame)) => {
                        warn!("DisplaySink: renderer refused frame, dropping");
                        self.health.record_frame_drop();
                        give_back = Some(frame);
                    }
                },
                None => give_back = Some(frame),
            }
        }
        if let Some(frame) = give_back {
            self.origin.release(frame);
        }
    }

    /// Move or resize the video region while the stream runs.
    pub fn set_region(&self, region: &DisplayRegion) -> bool {
        let mut renderer = self.renderer.lock().unwrap();
        match renderer.as_mut() {
            Some(renderer) => match renderer.set_display_region(region) {
                Ok(()) => true,
                Err(err) => {
                    warn!("DisplaySink: display region update failed: {err}");
                    false
                }
            },
            None => false,
        }
    }

    /// Disable the renderer's ports and drop it. Further frames are
    /// released to their pool instead of displayed.
    pub(crate) fn shutdown(&self) {
        let mut renderer = self.renderer.lock().unwrap();
        if let Some(mut renderer) = renderer.take() {
            renderer.disable_ports();
            info!("DisplaySink: renderer shut down");
        }
    }
}
