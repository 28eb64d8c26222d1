//! Blocking audio playback used as the consumption action.
//!
//! One output stream is opened for the whole run. Each track gets a fresh sink
//! and the call returns only when the track has finished, so the scheduler
//! never draws the next token while something is still playing.

use super::probe::probe;
use crate::consumer::{ConsumeError, Consumer, Emission};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub struct AudioPlayer {
    stream: OutputStream,
    volume: f32,
}

impl AudioPlayer {
    /// Open the default output device.
    pub fn new(volume: f32) -> Result<Self, Box<dyn Error>> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        log::info!("Opened default audio output, volume {volume}");
        Ok(Self { stream, volume })
    }

    /// Decode and play `path`, returning once playback has finished.
    pub fn play_blocking(&self, path: &Path) -> Result<(), ConsumeError> {
        match probe(path) {
            Ok(Some(info)) => log::info!(
                "Playing {}: {} Hz, {} channels, {} bits, duration {:?}",
                path.display(),
                info.sample_rate,
                info.channels,
                info.bits_per_sample,
                info.duration
            ),
            Ok(None) => log::info!("Playing {}", path.display()),
            Err(e) => log::debug!("Header probe failed for {}: {e}", path.display()),
        }

        if !path.is_file() {
            return Err(format!("not a playable file: {}", path.display()).into());
        }

        let file = BufReader::new(File::open(path)?);
        let source = Decoder::new(file)
            .map_err(|e| format!("cannot decode {}: {e}", path.display()))?;

        log::debug!(
            "Decoded {}: {} channels at {} Hz, total {:?}",
            path.display(),
            source.channels(),
            source.sample_rate(),
            source.total_duration()
        );

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.sleep_until_end();

        Ok(())
    }
}

impl Consumer<PathBuf> for AudioPlayer {
    fn consume(&mut self, emission: &Emission<'_, PathBuf>) -> Result<(), ConsumeError> {
        self.play_blocking(emission.token)
    }
}
