//! Audio metadata estimation
//!
//! Extracts duration/sample rate/channel count from uploaded files using
//! lofty, with a ranked fallback chain so ingestion never fails on bad
//! audio: precise probe → file-size heuristic → fixed default. Every tier
//! is total; the estimator never returns an error.

use lofty::file::AudioFile as _;
use lofty::probe::Probe;
use std::path::Path;

/// Extensions treated as audio; anything else is never audio
const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "wav", "m4a", "aac", "ogg", "flac", "wma", "aiff"];

/// Fallback duration when nothing about the file can be read, seconds
const DEFAULT_DURATION: f64 = 60.0;
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHANNELS: u32 = 2;

/// Estimated (or extracted) metadata for one uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProbe {
    pub is_audio: bool,
    /// Seconds
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u32,
}

impl AudioProbe {
    fn non_audio() -> Self {
        Self {
            is_audio: false,
            duration: 0.0,
            sample_rate: 0,
            channels: 0,
        }
    }

    fn fixed_default() -> Self {
        Self {
            is_audio: true,
            duration: DEFAULT_DURATION,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Lowercased extension of a declared filename
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Audio-ness is decided purely by the declared filename's extension
pub fn is_audio_filename(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Rough storage rate for the size-based duration heuristic
fn bytes_per_minute(extension: &str) -> f64 {
    match extension {
        // ~128 kbps compressed formats
        "mp3" | "m4a" => 1024.0 * 1024.0,
        // uncompressed PCM
        "wav" => 10.0 * 1024.0 * 1024.0,
        _ => 1024.0 * 1024.0,
    }
}

/// Metadata estimator service
pub struct MetadataEstimator {}

impl MetadataEstimator {
    pub fn new() -> Self {
        Self {}
    }

    /// Estimate metadata for a stored file.
    ///
    /// `declared_filename` is the client-supplied name and decides audio
    /// classification; `path` is where the bytes landed on disk.
    pub fn estimate(&self, path: &Path, declared_filename: &str) -> AudioProbe {
        if !is_audio_filename(declared_filename) {
            return AudioProbe::non_audio();
        }

        match self.probe_precise(path) {
            Ok(probe) => probe,
            Err(e) => {
                tracing::debug!(
                    file = %declared_filename,
                    error = %e,
                    "Precise metadata extraction failed, falling back to size heuristic"
                );
                self.estimate_from_size(path, declared_filename)
            }
        }
    }

    /// Tier 1: container/codec introspection via lofty
    fn probe_precise(&self, path: &Path) -> Result<AudioProbe, lofty::error::LoftyError> {
        let tagged_file = Probe::open(path)?.read()?;
        let properties = tagged_file.properties();

        Ok(AudioProbe {
            is_audio: true,
            duration: properties.duration().as_secs_f64(),
            sample_rate: properties.sample_rate().unwrap_or(DEFAULT_SAMPLE_RATE),
            channels: properties.channels().unwrap_or(DEFAULT_CHANNELS as u8) as u32,
        })
    }

    /// Tier 2: duration from file size and a format-specific rate, floored
    /// at one second. Tier 3 (fixed default) when even the size is
    /// unreadable.
    fn estimate_from_size(&self, path: &Path, declared_filename: &str) -> AudioProbe {
        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len() as f64,
            Err(e) => {
                tracing::warn!(
                    file = %declared_filename,
                    error = %e,
                    "Size estimation failed, using fixed default metadata"
                );
                return AudioProbe::fixed_default();
            }
        };

        let extension = extension_of(declared_filename).unwrap_or_default();
        let estimated = size / bytes_per_minute(&extension) * 60.0;

        AudioProbe {
            is_audio: true,
            duration: estimated.max(1.0),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl Default for MetadataEstimator {
    fn default() -> Self {
        Self::new()
    }
}
