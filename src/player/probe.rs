//! Header probing for log output.
//!
//! Reads only the stream headers of WAV and FLAC files so the player can log
//! what it is about to play. Other formats report nothing.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub duration: Option<Duration>,
}

/// Probe a file's stream info from its extension. Returns `Ok(None)` for
/// formats without a header reader.
pub fn probe(path: &Path) -> Result<Option<TrackInfo>, Box<dyn Error + Send + Sync>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => probe_wav(path).map(Some),
        "flac" => probe_flac(path).map(Some),
        _ => Ok(None),
    }
}

fn probe_wav(path: &Path) -> Result<TrackInfo, Box<dyn Error + Send + Sync>> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    // duration() is in frames, i.e. samples per channel
    let frames = reader.duration() as f64;
    let duration = (spec.sample_rate > 0)
        .then(|| Duration::from_secs_f64(frames / spec.sample_rate as f64));

    Ok(TrackInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        duration,
    })
}

fn probe_flac(path: &Path) -> Result<TrackInfo, Box<dyn Error + Send + Sync>> {
    let reader = claxon::FlacReader::open(path)?;
    let info = reader.streaminfo();

    let duration = match (info.samples, info.sample_rate) {
        (Some(frames), rate) if rate > 0 => {
            Some(Duration::from_secs_f64(frames as f64 / rate as f64))
        }
        _ => None,
    };

    Ok(TrackInfo {
        sample_rate: info.sample_rate,
        channels: info.channels as u16,
        bits_per_sample: info.bits_per_sample as u16,
        duration,
    })
}
