use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};

use crate::config::OutputConfig;
use crate::context::OutputFormat;
use crate::dsp::renderer::Renderer;
use crate::error::ToneError;

/// The host's default output device, written as interleaved f32.
#[derive(Default)]
pub struct CpalBackend {
    device: Option<cpal::Device>,
    config: Option<cpal::StreamConfig>,
    stream: Option<Stream>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::AudioBackend for CpalBackend {
    fn open(&mut self, preferred: &OutputConfig) -> Result<OutputFormat, ToneError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(ToneError::NoOutputDevice)?;
        log::info!("Output device: {}", device.name().unwrap_or_default());

        let supported = device.default_output_config()?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(ToneError::UnsupportedFormat {
                format: supported.sample_format().to_string(),
            });
        }

        let mut config: cpal::StreamConfig = supported.into();
        if let Some(sample_rate) = preferred.sample_rate {
            config.sample_rate = cpal::SampleRate(sample_rate);
        }
        let format = OutputFormat {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        };

        self.device = Some(device);
        self.config = Some(config);
        Ok(format)
    }

    fn attach(&mut self, mut renderer: Renderer) -> Result<(), ToneError> {
        let (Some(device), Some(config)) = (&self.device, &self.config) else {
            return Err(ToneError::StreamBuild("output device not opened".into()));
        };

        let stream = device.build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
            |err| log::error!("Output stream error: {err}"),
            None,
        )?;
        // Some hosts start streams as soon as they are built.
        if let Err(e) = stream.pause() {
            log::warn!("Could not pause new output stream: {e}");
        }
        self.stream = Some(stream);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ToneError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| ToneError::ResumeRejected("no output stream".into()))?;
        stream.play()?;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), ToneError> {
        if let Some(stream) = &self.stream {
            stream.pause()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Pause on close failed: {e}");
            }
        }
        self.config = None;
        self.device = None;
    }
}
