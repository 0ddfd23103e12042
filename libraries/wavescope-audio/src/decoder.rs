/// Audio decoding using Symphonia
///
/// Decodes a complete file into an [`AudioClip`] for playback scheduling
/// and offline analysis. Supports: MP3, FLAC, OGG, WAV, AAC, M4A.
use crate::clip::AudioClip;
use crate::error::{AudioError, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file fully into memory
///
/// The clip keeps the file's native channel count; conversion to f32 uses
/// symmetric scaling for signed integers (divide by 2^(N-1), not 2^(N-1)-1)
/// so the [-1.0, 1.0] range is symmetric.
pub fn decode_file(path: &Path) -> Result<AudioClip> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path).map_err(AudioError::Io)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // A hint from the extension helps the format registry guess the format
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
        .map_err(|e| AudioError::Symphonia(format!("Failed to probe file: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut first_buffer = true;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                // End of stream
                break;
            }
            Err(e) => {
                return Err(AudioError::Symphonia(format!(
                    "Failed to read packet: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if first_buffer {
                    // The decoded spec is authoritative over codec params
                    sample_rate = decoded.spec().rate;
                    channels = decoded.spec().channels.count() as u16;
                    first_buffer = false;
                }
                append_interleaved(&decoded, &mut samples);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Malformed packet - skip and keep decoding
                tracing::debug!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError(
            "No decodable audio data in file".to_string(),
        ));
    }

    Ok(AudioClip::new(samples, sample_rate, channels))
}

/// Append a decoded buffer to `out` as interleaved f32, all channels kept
fn append_interleaved(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => {
            // F32 audio can have intersample peaks > 1.0, so we clamp
            interleave(buf, out, |s| s.clamp(-1.0, 1.0));
        }
        AudioBufferRef::F64(buf) => {
            interleave(buf, out, |s| (s as f32).clamp(-1.0, 1.0));
        }
        AudioBufferRef::S32(buf) => {
            interleave(buf, out, |s| s as f32 / 2147483648.0);
        }
        AudioBufferRef::S24(buf) => {
            interleave(buf, out, |s| s.inner() as f32 / 8388608.0);
        }
        AudioBufferRef::S16(buf) => {
            interleave(buf, out, |s| s as f32 / 32768.0);
        }
        AudioBufferRef::S8(buf) => {
            interleave(buf, out, |s| s as f32 / 128.0);
        }
        AudioBufferRef::U32(buf) => {
            interleave(buf, out, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U24(buf) => {
            interleave(buf, out, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0);
        }
        AudioBufferRef::U16(buf) => {
            interleave(buf, out, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U8(buf) => {
            interleave(buf, out, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0);
        }
    }
}

/// Interleave a planar buffer into `out`, preserving the channel count
fn interleave<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    out: &mut Vec<f32>,
    normalize: F,
) where
    T: symphonia::core::sample::Sample + Copy,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    let channels = buf.spec().channels.count();
    out.reserve(frames * channels);

    for frame in 0..frames {
        for ch in 0..channels {
            out.push(normalize(buf.chan(ch)[frame]));
        }
    }
}
