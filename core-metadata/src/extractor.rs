//! # Audio Duration Probe
//!
//! Reads the container headers of an imported file with `lofty` to learn its
//! real duration and MIME type. Tags are not consulted; display metadata
//! comes from filename analysis.

use crate::error::{MetadataError, Result};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use std::io::Cursor;
use tracing::debug;

/// What a probe learned about an audio payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedAudio {
    /// Seconds, fractional
    pub duration_secs: f64,
    pub mime_type: String,
}

/// Measures audio payloads.
pub trait DurationProbe: Send + Sync {
    fn probe(&self, data: &[u8]) -> Result<ProbedAudio>;
}

/// [`DurationProbe`] backed by `lofty`.
#[derive(Debug, Clone)]
pub struct LoftyDurationProbe {
    parse_options: ParseOptions,
}

impl LoftyDurationProbe {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }
}

impl Default for LoftyDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationProbe for LoftyDurationProbe {
    fn probe(&self, data: &[u8]) -> Result<ProbedAudio> {
        if data.is_empty() {
            return Err(MetadataError::ProbeFailed("empty payload".to_string()));
        }

        let tagged_file = Probe::new(Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| MetadataError::ProbeFailed(format!("unrecognised container: {}", e)))?
            .read()
            .map_err(|e| MetadataError::ProbeFailed(format!("unreadable audio: {}", e)))?;

        let file_type = tagged_file.file_type();
        let duration_secs = tagged_file.properties().duration().as_secs_f64();

        debug!(?file_type, duration_secs, "Probed audio payload");

        Ok(ProbedAudio {
            duration_secs,
            mime_type: mime_type_for(file_type).to_string(),
        })
    }
}

fn mime_type_for(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Aac => "audio/aac",
        FileType::Aiff => "audio/aiff",
        FileType::Flac => "audio/flac",
        FileType::Mpeg => "audio/mpeg",
        FileType::Mp4 => "audio/mp4",
        FileType::Opus => "audio/opus",
        FileType::Vorbis => "audio/ogg",
        FileType::Wav => "audio/wav",
        FileType::WavPack => "audio/wavpack",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One second of 8 kHz mono 16-bit silence as a RIFF/WAVE file.
    pub(crate) fn one_second_wav() -> Vec<u8> {
        let sample_rate: u32 = 8_000;
        let data_len: u32 = sample_rate * 2;

        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&1u16.to_le_bytes()); // mono
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(44 + data_len as usize, 0);
        wav
    }

    #[test]
    fn probes_wav_duration() {
        let probed = LoftyDurationProbe::new().probe(&one_second_wav()).unwrap();

        assert!((probed.duration_secs - 1.0).abs() < 0.01);
        assert_eq!(probed.mime_type, "audio/wav");
    }

    #[test]
    fn rejects_garbage() {
        let err = LoftyDurationProbe::new()
            .probe(b"definitely not audio")
            .unwrap_err();
        assert!(matches!(err, MetadataError::ProbeFailed(_)));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(LoftyDurationProbe::default().probe(&[]).is_err());
    }
}
