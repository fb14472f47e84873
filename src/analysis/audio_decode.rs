use std::fs::File;
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

/// Interleaved `f32` samples straight out of the decoder.
pub(crate) struct DecodedAudio {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
}

/// Decode a clip into interleaved `f32` samples, optionally bounded to the
/// first `max_seconds` of audio.
pub(crate) fn decode_clip(path: &Path, max_seconds: Option<f32>) -> Result<DecodedAudio, String> {
    let file = File::open(path).map_err(|err| format!("Open {}: {err}", path.display()))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| format!("Probe failed for {}: {err}", path.display()))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| format!("No default audio track in {}", path.display()))?;
    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| format!("Missing sample rate in {}", path.display()))?
        .max(1);
    let channels = params
        .channels
        .ok_or_else(|| format!("Missing channel layout in {}", path.display()))?
        .count()
        .max(1) as u16;
    let sample_limit = sample_limit(max_seconds, sample_rate, channels);

    let mut decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|err| format!("No decoder for {}: {err}", path.display()))?;

    let mut samples = Vec::new();
    while sample_limit.is_none_or(|limit| samples.len() < limit) {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break,
            Err(err) => {
                return Err(format!("Packet read failed for {}: {err}", path.display()));
            }
        };
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt packets are skipped; the rest of the stream may still decode.
            Err(Error::DecodeError(_)) => continue,
            Err(err) => {
                return Err(format!("Decode failed for {}: {err}", path.display()));
            }
        };
        let spec = *decoded.spec();
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }
    if let Some(limit) = sample_limit {
        samples.truncate(limit);
    }

    if samples.is_empty() {
        return Err(format!("Decoded zero samples from {}", path.display()));
    }
    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

fn sample_limit(max_seconds: Option<f32>, sample_rate: u32, channels: u16) -> Option<usize> {
    let limit = max_seconds.filter(|seconds| *seconds > 0.0)?;
    let frames = (limit * sample_rate as f32).ceil().max(1.0) as usize;
    Some(frames.saturating_mul(channels as usize))
}
