//! Loudness envelope extraction
//!
//! Segments an audio file into fixed-duration windows and converts each
//! window into a normalized loudness sample for waveform rendering. Three
//! interchangeable strategies are provided; they are alternative algorithms
//! over the same contract, not layered subsystems.
//!
//! All strategies normalize a window's dB value against a fixed -50 dB
//! floor and scale the result by 20 for display amplitude. Silence maps to
//! 0.0, the floor.

use crate::error::{EnvelopeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use wavescope_audio::AudioClip;

/// Normalization floor in dB; windows at or below this render as silence
pub const LOUDNESS_FLOOR_DB: f64 = -50.0;

/// Display amplitude scale applied to the normalized level
pub const DISPLAY_SCALE: f64 = 20.0;

/// Envelope extraction configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Analysis window length in seconds (default: 0.1)
    pub segment_duration: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            segment_duration: 0.1,
        }
    }
}

/// Loudness envelope extractor
///
/// Stateless across calls - each extraction owns its buffers, so one
/// extractor can serve many files. Every strategy returns `None` on any
/// file-access or decode failure, never a partial sequence; the cause is
/// logged and not otherwise distinguishable.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeExtractor {
    config: EnvelopeConfig,
}

impl EnvelopeExtractor {
    /// Create an extractor with the default 100 ms window
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with an explicit configuration
    pub fn with_config(config: EnvelopeConfig) -> Self {
        Self { config }
    }

    /// Analysis window length in frames at the given sample rate
    ///
    /// `None` if the configured segment duration rounds to zero frames.
    pub fn frames_per_segment(&self, sample_rate: u32) -> Option<u64> {
        let frames = (sample_rate as f64 * self.config.segment_duration).round() as u64;
        (frames > 0).then_some(frames)
    }

    /// Number of envelope samples one segment-per-window strategy yields
    ///
    /// `ceil(frame_count / frames_per_segment)`; useful for sizing a
    /// waveform view before extracting.
    pub fn segment_count(&self, frame_count: u64, sample_rate: u32) -> Option<u64> {
        let per_segment = self.frames_per_segment(sample_rate)?;
        Some(frame_count.div_ceil(per_segment))
    }

    /// Buffer-based extraction, one sample per channel per segment
    ///
    /// Decodes the full file, then computes per-channel RMS per window.
    /// Known inconsistency, kept for compatibility with existing waveform
    /// data: the dB value is `log10(RMS)` without the 20x decibel scaling
    /// used by the other strategies, and multi-channel files emit one
    /// sample per channel per segment (channels interleave in the output)
    /// rather than one per segment. Prefer
    /// [`extract_averaged`](Self::extract_averaged) for a
    /// channel-independent sequence.
    pub fn extract_per_channel(&self, path: &Path) -> Option<Vec<f32>> {
        self.surface(self.try_extract_per_channel(path), path, "per-channel")
    }

    /// Buffer-based extraction, one sample per segment
    ///
    /// Same segmentation as [`extract_per_channel`](Self::extract_per_channel),
    /// but per-channel RMS values are averaged into a single RMS before the
    /// standard `20 * log10(RMS)` conversion, so the output length is the
    /// segment count regardless of channel count.
    pub fn extract_averaged(&self, path: &Path) -> Option<Vec<f32>> {
        self.surface(self.try_extract_averaged(path), path, "averaged")
    }

    /// Container-level extraction over a mono 16-bit stream
    ///
    /// Streams the container through the demuxer instead of the full-decode
    /// path, downmixes each packet to mono 16-bit PCM, and accumulates raw
    /// samples per window by sample count at the track's native rate. Uses
    /// the standard `20 * log10(RMS)` conversion and flushes a final
    /// partial window.
    pub fn extract_downmixed(&self, path: &Path) -> Option<Vec<f32>> {
        self.surface(self.try_extract_downmixed(path), path, "downmixed")
    }

    fn surface(&self, result: Result<Vec<f32>>, path: &Path, strategy: &str) -> Option<Vec<f32>> {
        match result {
            Ok(levels) => Some(levels),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    strategy,
                    error = %e,
                    "envelope extraction failed"
                );
                None
            }
        }
    }

    fn try_extract_per_channel(&self, path: &Path) -> Result<Vec<f32>> {
        let clip = wavescope_audio::decode_file(path)?;
        let per_segment = self.checked_frames_per_segment(clip.sample_rate())?;
        let channels = clip.channels() as usize;

        let segments = clip.frame_count().div_ceil(per_segment);
        let mut levels = Vec::with_capacity((segments as usize) * channels);

        let mut start = 0;
        while start < clip.frame_count() {
            let window = clip.segment(start, per_segment);
            for ch in 0..channels {
                let rms = channel_rms(window, channels, ch);
                // Pseudo-dB: log10 without the 20x decibel scaling
                levels.push(normalize_level(rms.log10()));
            }
            start += per_segment;
        }

        Ok(levels)
    }

    fn try_extract_averaged(&self, path: &Path) -> Result<Vec<f32>> {
        let clip = wavescope_audio::decode_file(path)?;
        let per_segment = self.checked_frames_per_segment(clip.sample_rate())?;
        let channels = clip.channels() as usize;

        let mut levels = Vec::with_capacity(clip.frame_count().div_ceil(per_segment) as usize);

        let mut start = 0;
        while start < clip.frame_count() {
            let window = clip.segment(start, per_segment);
            let rms_sum: f64 = (0..channels).map(|ch| channel_rms(window, channels, ch)).sum();
            let rms = rms_sum / channels as f64;
            levels.push(normalize_level(DISPLAY_SCALE * rms.log10()));
            start += per_segment;
        }

        Ok(levels)
    }

    fn try_extract_downmixed(&self, path: &Path) -> Result<Vec<f32>> {
        if !path.exists() {
            return Err(EnvelopeError::ExtractionFailed(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EnvelopeError::ExtractionFailed(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| EnvelopeError::ExtractionFailed("no audio tracks".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| EnvelopeError::ExtractionFailed(e.to_string()))?;

        let mut levels = Vec::new();
        let mut carry: Vec<i16> = Vec::new();
        let mut samples_per_segment: Option<usize> = None;
        let mut sample_buf: Option<(SampleBuffer<i16>, SignalSpec)> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(EnvelopeError::ExtractionFailed(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!("skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(EnvelopeError::ExtractionFailed(e.to_string())),
            };

            let spec = *decoded.spec();
            if sample_rate.is_none() {
                sample_rate = Some(spec.rate);
            }

            // Reusable interleave buffer, rebuilt only if the spec changes
            let needs_new = sample_buf
                .as_ref()
                .map_or(true, |(_, s)| s.rate != spec.rate || s.channels != spec.channels);
            if needs_new {
                sample_buf = Some((
                    SampleBuffer::<i16>::new(decoded.capacity() as u64, spec),
                    spec,
                ));
            }
            let Some((buf, _)) = sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            // Downmix interleaved frames to mono 16-bit
            let channels = spec.channels.count().max(1);
            for frame in buf.samples().chunks_exact(channels) {
                let sum: i32 = frame.iter().map(|s| i32::from(*s)).sum();
                carry.push((sum / channels as i32) as i16);
            }

            if samples_per_segment.is_none() {
                if let Some(rate) = sample_rate {
                    samples_per_segment = Some(self.checked_frames_per_segment(rate)? as usize);
                }
            }

            if let Some(per_segment) = samples_per_segment {
                while carry.len() >= per_segment {
                    levels.push(mono_segment_level(&carry[..per_segment]));
                    carry.drain(..per_segment);
                }
            }
        }

        // Final partial segment
        if !carry.is_empty() {
            levels.push(mono_segment_level(&carry));
        }

        if levels.is_empty() {
            return Err(EnvelopeError::ExtractionFailed(
                "no decodable audio data in file".to_string(),
            ));
        }

        Ok(levels)
    }

    fn checked_frames_per_segment(&self, sample_rate: u32) -> Result<u64> {
        self.frames_per_segment(sample_rate).ok_or_else(|| {
            EnvelopeError::ExtractionFailed(format!(
                "segment duration {} is too short at {} Hz",
                self.config.segment_duration, sample_rate
            ))
        })
    }
}

/// RMS of one channel within an interleaved window
fn channel_rms(window: &[f32], channels: usize, channel: usize) -> f64 {
    let frames = window.len() / channels;
    if frames == 0 {
        return 0.0;
    }

    let sum: f64 = window
        .iter()
        .skip(channel)
        .step_by(channels)
        .map(|s| f64::from(*s) * f64::from(*s))
        .sum();
    (sum / frames as f64).sqrt()
}

/// Loudness level of a mono 16-bit window via `20 * log10(RMS)`
fn mono_segment_level(samples: &[i16]) -> f32 {
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let normalized = f64::from(*s) / 32768.0;
            normalized * normalized
        })
        .sum();
    let rms = (sum / samples.len() as f64).sqrt();
    normalize_level(DISPLAY_SCALE * rms.log10())
}

/// Normalize a dB value against the fixed floor and scale for display
///
/// `max((db - floor) / -floor, 0) * 20`. Silence (`-inf` dB) maps to 0.0.
fn normalize_level(db: f64) -> f32 {
    let level = ((db - LOUDNESS_FLOOR_DB) / -LOUDNESS_FLOOR_DB).max(0.0);
    (level * DISPLAY_SCALE) as f32
}
