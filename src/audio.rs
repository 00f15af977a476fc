//! Audio payload decoding and WAV export.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, instrument};

/// Decode one persisted audio payload into raw little-endian 16-bit PCM.
pub fn decode_segment(payload: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(payload.trim())?)
}

/// Duration in seconds of `bytes` of 16-bit mono PCM.
pub fn pcm_duration_secs(bytes: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (bytes / 2) as f64 / sample_rate as f64
}

/// Write every segment, in order, into one mono 16-bit WAV file.
///
/// Returns the number of samples written. A trailing odd byte in a segment is ignored.
#[instrument(skip(segments), fields(segments = segments.len()))]
pub fn stitch_wav<S: AsRef<str>>(segments: &[S], sample_rate: u32, path: &Path) -> Result<u64> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let mut samples = 0u64;

    for (i, segment) in segments.iter().enumerate() {
        let pcm = decode_segment(segment.as_ref())?;
        for chunk in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
            samples += 1;
        }
        debug!(segment = i + 1, bytes = pcm.len(), "Appended segment");
    }

    writer.finalize()?;
    Ok(samples)
}

/// Make a subject usable as a file stem.
///
/// Reserved characters and path separators become `_`, each whitespace run
/// becomes one `_`, the result is lowercased, and an empty result becomes `podcast`.
pub fn sanitize_file_stem(subject: &str) -> String {
    let mut stem = String::with_capacity(subject.len());
    let mut in_space = false;

    for c in subject.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            '\\' | '/' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => stem.push('_'),
            c => stem.extend(c.to_lowercase()),
        }
    }

    if stem.is_empty() {
        "podcast".to_string()
    } else {
        stem
    }
}
