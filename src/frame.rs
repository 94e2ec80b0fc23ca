//! Frame codec: header + per-channel LMS block + interleaved slices.
//!
//! A frame covers up to [`crate::QOA_FRAME_LEN`] samples per channel
//! (256 slices x 20 samples). The last frame of a stream may be shorter.

use tracing::{debug, trace};

use crate::errors::malformed;
use crate::io::{ReadU64, WriteU64};
use crate::lms::LMS_LEN;
use crate::lms::LmsState;
use crate::slice::{decode_slice, encode_slice, SLICE_LEN};
use crate::{Result, QOA_MAX_CHANNELS};

/// `frame_size(channels, slices) == 8 + 16*channels + 8*slices*channels`.
#[inline]
pub fn frame_size(channels: usize, slices: usize) -> usize {
    8 + 16 * channels + 8 * slices * channels
}

/// Number of 20-sample slices needed to cover `fsamples` samples.
#[inline]
pub fn slices_for(fsamples: usize) -> usize {
    (fsamples + SLICE_LEN - 1) / SLICE_LEN
}

/// Packs one channel's `history`/`weights` into 8 bytes each (index 0 is
/// the most significant 16 bits), in the layout a frame's per-channel LMS
/// block uses on the wire.
fn pack_lms_word(values: &[i32; LMS_LEN]) -> u64 {
    let mut word = 0u64;
    for &v in values {
        word = (word << 16) | (v as i16 as u16 as u64);
    }
    word
}

/// Inverse of [`pack_lms_word`]: splits a packed word into 4 sign-extended
/// 16-bit values, index 0 first (most significant).
fn unpack_lms_word(word: u64) -> [i32; LMS_LEN] {
    let mut out = [0i32; LMS_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 48 - 16 * i;
        *slot = ((word >> shift) & 0xFFFF) as u16 as i16 as i32;
    }
    out
}

/// Encodes one frame of up to `fsamples` (<= [`crate::QOA_FRAME_LEN`])
/// samples per channel from channel-interleaved `pcm`, writing into `out`
/// starting at `*cursor`. `lms` holds the frame-start predictor state per
/// channel; it is written into the header verbatim and then advanced by
/// the per-slice search to become the next frame's frame-start state.
///
/// Returns `(bytes_written, total_squared_error)`; `bytes_written` always
/// equals `frame_size`.
pub fn encode_frame(
    pcm: &[i16],
    channels: usize,
    samplerate: u32,
    fsamples: usize,
    lms: &mut [LmsState],
    out: &mut [u8],
    cursor: &mut usize,
) -> (usize, u64) {
    debug_assert_eq!(lms.len(), channels);
    debug_assert_eq!(pcm.len(), fsamples * channels);

    let slices = slices_for(fsamples);
    let size = frame_size(channels, slices);
    let start = *cursor;

    let header = ((channels as u64) << 56)
        | ((samplerate as u64) << 32)
        | ((fsamples as u64) << 16)
        | (size as u64);
    out.write_u64(header, cursor);

    for c in 0..channels {
        out.write_u64(pack_lms_word(&lms[c].history), cursor);
        out.write_u64(pack_lms_word(&lms[c].weights), cursor);
    }

    let mut total_err = 0u64;
    let mut scratch = [0i16; SLICE_LEN];
    for k in 0..slices {
        let from = k * SLICE_LEN;
        let to = std::cmp::min(from + SLICE_LEN, fsamples);
        let len = to - from;

        for c in 0..channels {
            for (i, sample) in scratch[..len].iter_mut().enumerate() {
                *sample = pcm[(from + i) * channels + c];
            }
            let enc = encode_slice(&scratch[..len], &lms[c]);
            out.write_u64(enc.packed, cursor);
            lms[c] = enc.lms;
            total_err += enc.err;
        }
    }

    trace!(
        channels,
        fsamples,
        slices,
        total_err,
        "encoded frame"
    );

    debug_assert_eq!(*cursor - start, size);
    (size, total_err)
}

/// Decodes one frame from `bytes`, validating it against `channels`/
/// `samplerate` from the stream descriptor. Reconstructed samples are
/// written channel-interleaved into `out` starting at sample-frame 0 of
/// `out` (i.e. `out[i * channels + c]`).
///
/// `lms` holds the frame-start predictor state on entry; it is read fresh
/// from the frame header (discarding whatever the caller passed in) and
/// left holding the frame-end state on return, ready for the next frame.
///
/// Returns `(bytes_consumed, fsamples)`.
pub fn decode_frame(
    bytes: &[u8],
    channels: u32,
    samplerate: u32,
    lms: &mut [LmsState],
    out: &mut [i16],
) -> Result<(usize, usize)> {
    debug_assert_eq!(lms.len(), channels as usize);

    if channels == 0 || channels > QOA_MAX_CHANNELS {
        return malformed("channels out of range [1, 8]");
    }

    let mut cursor = 0usize;
    let header = bytes.read_u64(&mut cursor)?;

    let f_channels = (header >> 56) & 0xFF;
    let f_samplerate = (header >> 32) & 0xFF_FFFF;
    let fsamples = ((header >> 16) & 0xFFFF) as usize;
    let frame_size_hdr = (header & 0xFFFF) as usize;

    if f_channels != channels as u64 {
        debug!(expected = channels, got = f_channels, "channel mismatch");
        return malformed("frame channel count disagrees with stream");
    }
    if f_samplerate != samplerate as u64 {
        debug!(
            expected = samplerate,
            got = f_samplerate,
            "samplerate mismatch"
        );
        return malformed("frame samplerate disagrees with stream");
    }
    if frame_size_hdr > bytes.len() {
        return malformed("frame size exceeds remaining buffer");
    }

    let lms_block_len = 16 * channels as usize;
    if frame_size_hdr < 8 + lms_block_len {
        return malformed("frame smaller than its own header");
    }
    let slices = (frame_size_hdr - 8 - lms_block_len) / 8 / channels as usize;
    if fsamples > slices * SLICE_LEN {
        return malformed("declared samples exceed slice capacity");
    }

    for c in 0..channels as usize {
        let history = unpack_lms_word(bytes.read_u64(&mut cursor)?);
        let weights = unpack_lms_word(bytes.read_u64(&mut cursor)?);
        lms[c] = LmsState { history, weights };
    }

    if out.len() < fsamples * channels as usize {
        return malformed("output buffer too small for frame");
    }

    let mut scratch = [0i16; SLICE_LEN];
    for k in 0..slices {
        let from = k * SLICE_LEN;
        let to = std::cmp::min(from + SLICE_LEN, fsamples);
        let len = to.saturating_sub(from);
        if len == 0 {
            // Extra slices beyond what fsamples needs still occupy their
            // 8 bytes on the wire; skip them without decoding.
            cursor += 8 * channels as usize;
            continue;
        }

        for c in 0..channels as usize {
            let word = bytes.read_u64(&mut cursor)?;
            decode_slice(word, &mut lms[c], &mut scratch[..len]);
            for (i, &s) in scratch[..len].iter().enumerate() {
                out[(from + i) * channels as usize + c] = s;
            }
        }
    }

    debug!(fsamples, slices, bytes_consumed = cursor, "decoded frame");

    Ok((cursor, fsamples))
}
