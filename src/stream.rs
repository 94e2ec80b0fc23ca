//! Stream codec: file header + sequence of frames, and the top-level
//! `encode`/`decode` entry points.

use tracing::{info, instrument, trace};

use crate::errors::{invalid_descriptor, malformed, short_read};
use crate::frame::{decode_frame, encode_frame, frame_size, slices_for};
use crate::io::{ReadU64, WriteU64};
use crate::lms::LmsState;
use crate::{Result, QOA_FRAME_LEN, QOA_MAGIC, QOA_MAX_CHANNELS, QOA_MIN_FILESIZE};

/// Describes one QOA stream: its shape plus the live per-channel predictor
/// state for the encode/decode call in progress.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    pub channels: u32,
    pub samplerate: u32,
    /// Total samples per channel.
    pub samples: u32,
    pub lms: Vec<LmsState>,
    /// Sum of squared per-sample errors across the encode, accumulated
    /// from each slice's *winning* candidate. Not part of the wire
    /// format; reset at the start of every [`encode`] call. Left at `0`
    /// after [`decode`] (the decoder never runs the scalefactor search).
    pub total_error: u64,
}

impl StreamDescriptor {
    /// Builds a descriptor with the canonical initial LMS state (§3:
    /// `weights = {0, 0, -8192, 16384}`, `history = {0, 0, 0, 0}`) for
    /// every channel, ready to hand to [`encode`].
    pub fn new(channels: u32, samplerate: u32, samples: u32) -> Self {
        StreamDescriptor {
            channels,
            samplerate,
            samples,
            lms: vec![LmsState::INITIAL; channels as usize],
            total_error: 0,
        }
    }

    fn validate_for_encode(&self) -> Result<()> {
        if self.channels == 0 || self.channels > QOA_MAX_CHANNELS {
            return invalid_descriptor("channels out of range [1, 8]");
        }
        if self.samplerate == 0 || self.samplerate > 0x00FF_FFFF {
            return invalid_descriptor("samplerate out of range [1, 0xFFFFFF]");
        }
        if self.samples == 0 {
            return invalid_descriptor("samples must be nonzero");
        }
        Ok(())
    }
}

/// Exact encoded size for `samples` samples per channel on `channels`
/// channels, per the size law in spec.md §8.
pub fn encoded_size(channels: u32, samples: u32) -> usize {
    let samples = samples as usize;
    let channels = channels as usize;
    let num_frames = (samples + QOA_FRAME_LEN - 1) / QOA_FRAME_LEN;
    let num_slices = slices_for(samples);
    8 + num_frames * 8 + num_frames * 16 * channels + num_slices * 8 * channels
}

/// Encodes `pcm` (channel-interleaved, `samples * channels` elements)
/// according to `desc`. `desc.lms` is reset to the canonical initial state
/// and `desc.total_error` is reset to 0 before encoding; both reflect the
/// end of the encode when this returns successfully.
#[instrument(skip(pcm, desc), fields(channels = desc.channels, samples = desc.samples))]
pub fn encode(pcm: &[i16], desc: &mut StreamDescriptor) -> Result<Vec<u8>> {
    desc.validate_for_encode()?;

    let channels = desc.channels as usize;
    if pcm.len() != desc.samples as usize * channels {
        return invalid_descriptor("pcm length does not match samples * channels");
    }

    let total_size = encoded_size(desc.channels, desc.samples);
    let mut out = vec![0u8; total_size];
    let mut cursor = 0usize;

    let header = ((QOA_MAGIC as u64) << 32) | desc.samples as u64;
    out.write_u64(header, &mut cursor);

    desc.lms = vec![LmsState::INITIAL; channels];
    desc.total_error = 0;

    let mut remaining = desc.samples as usize;
    let mut pcm_offset = 0usize;
    let mut frame_count = 0u32;

    while remaining > 0 {
        let fsamples = std::cmp::min(remaining, QOA_FRAME_LEN);
        let frame_pcm = &pcm[pcm_offset * channels..(pcm_offset + fsamples) * channels];

        let (written, frame_err) = encode_frame(
            frame_pcm,
            channels,
            desc.samplerate,
            fsamples,
            &mut desc.lms,
            &mut out,
            &mut cursor,
        );
        debug_assert_eq!(written, frame_size(channels, slices_for(fsamples)));
        desc.total_error += frame_err;

        pcm_offset += fsamples;
        remaining -= fsamples;
        frame_count += 1;
    }

    trace!(
        frame_count,
        total_bytes = cursor,
        total_error = desc.total_error,
        "stream encoded"
    );
    debug_assert_eq!(cursor, total_size);

    Ok(out)
}

/// Partial decode result from [`decode_header`]: stream shape without any
/// PCM, plus the number of bytes the file header occupied (always 8).
pub struct HeaderInfo {
    pub samples: u32,
}

/// Reads just the 8-byte file header: magic + total samples per channel.
pub fn decode_header(bytes: &[u8]) -> Result<(HeaderInfo, usize)> {
    if bytes.len() < QOA_MIN_FILESIZE {
        return short_read(QOA_MIN_FILESIZE, bytes.len());
    }

    let mut cursor = 0usize;
    let header = bytes.read_u64(&mut cursor)?;
    let magic = (header >> 32) as u32;
    if magic != QOA_MAGIC {
        return malformed("bad magic");
    }
    let samples = header as u32;
    if samples == 0 {
        return malformed("samples is zero");
    }

    Ok((HeaderInfo { samples }, cursor))
}

/// Decodes a full QOA byte stream into channel-interleaved PCM plus its
/// descriptor.
#[instrument(skip(bytes))]
pub fn decode(bytes: &[u8]) -> Result<(Vec<i16>, StreamDescriptor)> {
    let (header_info, mut cursor) = decode_header(bytes)?;

    // Peek the first frame header (without consuming) for channels/samplerate.
    if bytes.len() < cursor + 8 {
        return short_read(cursor + 8, bytes.len());
    }
    let mut peek_cursor = cursor;
    let first_frame_header = bytes.read_u64(&mut peek_cursor)?;
    let channels = ((first_frame_header >> 56) & 0xFF) as u32;
    let samplerate = ((first_frame_header >> 32) & 0xFF_FFFF) as u32;

    if channels == 0 || channels > QOA_MAX_CHANNELS {
        return malformed("first frame declares invalid channel count");
    }
    if samplerate == 0 {
        return malformed("first frame declares zero samplerate");
    }

    let mut desc = StreamDescriptor::new(channels, samplerate, header_info.samples);
    let total_samples = header_info.samples as usize;
    let mut pcm = vec![0i16; total_samples * channels as usize];

    let mut sample_index = 0usize;
    let mut frame_count = 0u32;
    while sample_index < total_samples {
        let frame_bytes = &bytes[cursor..];
        let out_slice = &mut pcm[sample_index * channels as usize..];

        let (consumed, fsamples) =
            decode_frame(frame_bytes, channels, samplerate, &mut desc.lms, out_slice)?;
        if consumed == 0 {
            return malformed("frame decode consumed zero bytes");
        }

        cursor += consumed;
        sample_index += fsamples;
        frame_count += 1;
    }

    desc.samples = sample_index as u32;
    info!(frame_count, total_bytes = cursor, "stream decoded");

    Ok((pcm, desc))
}
