//! Slice codec: 20 samples of one channel packed into one 64-bit word.
//!
//! A slice word is `scalefactor (4 bits) | residual_0 (3 bits) | ... |
//! residual_19 (3 bits)`, scalefactor in the high bits. The encoder runs a
//! brute-force search over all 16 scalefactors and keeps the one with the
//! lowest squared reconstruction error, with early termination once a
//! candidate's running error exceeds the best found so far.

use crate::lms::{clamp, div, LmsState};
use crate::tables::{DEQUANT_TAB, QUANT_TAB};

/// Samples per slice.
pub const SLICE_LEN: usize = 20;

/// Result of encoding one slice: the packed word, the LMS state to carry
/// forward, and the winning candidate's squared error (for
/// `StreamDescriptor::total_error`).
pub struct EncodedSlice {
    pub packed: u64,
    pub lms: LmsState,
    pub err: u64,
}

/// Encodes up to [`SLICE_LEN`] samples of one channel, searching all 16
/// scalefactors for the lowest squared error.
///
/// `samples.len()` must be in `1..=SLICE_LEN`. The search never mutates
/// `lms_in`; each candidate runs against its own copy so a rejected
/// candidate cannot leak state into the next.
pub fn encode_slice(samples: &[i16], lms_in: &LmsState) -> EncodedSlice {
    debug_assert!(!samples.is_empty() && samples.len() <= SLICE_LEN);

    let mut best_err = u64::MAX;
    let mut best_packed = 0u64;
    let mut best_lms = *lms_in;

    for sf in 0..16usize {
        let mut lms = *lms_in;
        let mut packed = sf as u64;
        let mut err = 0u64;
        let mut overflowed = false;

        for &s in samples {
            let sample = s as i32;
            let predicted = lms.predict();
            let residual = sample - predicted;
            let scaled = div(residual, sf);
            let clamped = clamp(scaled, -8, 8);
            let q = QUANT_TAB[(clamped + 8) as usize];
            let dq = DEQUANT_TAB[sf][q as usize];
            let reconstructed = clamp(predicted + dq, -32768, 32767);
            let e = (sample - reconstructed) as i64;
            err += (e * e) as u64;
            if err > best_err {
                overflowed = true;
                break;
            }
            lms.update(reconstructed, dq);
            packed = (packed << 3) | q as u64;
        }

        if !overflowed && err < best_err {
            best_err = err;
            best_packed = packed;
            best_lms = lms;
        }
    }

    if samples.len() < SLICE_LEN {
        best_packed <<= (SLICE_LEN - samples.len()) * 3;
    }

    EncodedSlice {
        packed: best_packed,
        lms: best_lms,
        err: best_err,
    }
}

/// Decodes one slice word into up to [`SLICE_LEN`] samples, written into
/// `out` (`out.len()` must be `1..=SLICE_LEN`), advancing `lms` in place.
///
/// The remaining 3-bit codes past `out.len()` (the zero-padded tail of a
/// truncated final slice) are ignored rather than validated.
pub fn decode_slice(word: u64, lms: &mut LmsState, out: &mut [i16]) {
    debug_assert!(!out.is_empty() && out.len() <= SLICE_LEN);

    let sf = ((word >> 60) & 0xF) as usize;
    let mut slice = word << 4;

    for sample in out.iter_mut() {
        let q = ((slice >> 61) & 0x7) as usize;
        slice <<= 3;

        let predicted = lms.predict();
        let dq = DEQUANT_TAB[sf][q];
        let reconstructed = clamp(predicted + dq, -32768, 32767);
        *sample = reconstructed as i16;
        lms.update(reconstructed, dq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_zero_slice_round_trips() {
        let samples = [0i16; SLICE_LEN];
        let lms_in = LmsState::INITIAL;
        let enc = encode_slice(&samples, &lms_in);
        assert_eq!(enc.packed >> 60, 0, "zero input should pick scalefactor 0");

        let mut lms = lms_in;
        let mut out = [0i16; SLICE_LEN];
        decode_slice(enc.packed, &mut lms, &mut out);
        assert_eq!(out, samples);
        assert_eq!(lms, enc.lms);
    }

    #[test]
    fn encode_decode_short_slice_pads_tail_with_zero_codes() {
        let samples = [100i16, -100, 200];
        let lms_in = LmsState::INITIAL;
        let enc = encode_slice(&samples, &lms_in);

        let tail_bits = (SLICE_LEN - samples.len()) * 3;
        let tail_mask = (1u64 << tail_bits) - 1;
        assert_eq!(enc.packed & tail_mask, 0);

        let mut lms = lms_in;
        let mut out = [0i16; 3];
        decode_slice(enc.packed, &mut lms, &mut out);
        // Lossy codec: just assert it's in the right ballpark and doesn't panic.
        for (o, s) in out.iter().zip(samples.iter()) {
            assert!((*o as i32 - *s as i32).abs() < 5000);
        }
    }

    #[test]
    fn bit_layout_extracts_scalefactor_and_residuals() {
        // Hand-build a word: scalefactor 3, all residual codes = 5.
        let sf: u64 = 3;
        let mut word = sf << 60;
        for k in 0..SLICE_LEN {
            word |= 5u64 << (57 - 3 * k);
        }
        assert_eq!((word >> 60) & 0xF, sf);
        for k in 0..SLICE_LEN {
            assert_eq!((word >> (57 - 3 * k)) & 0x7, 5);
        }
    }

    #[test]
    fn tie_break_prefers_lowest_scalefactor() {
        // An all-zero input is a perfect match (err == 0) at every
        // scalefactor once the predictor is at rest, so the strict `<`
        // comparison must keep scalefactor 0.
        let samples = [0i16; SLICE_LEN];
        let enc = encode_slice(&samples, &LmsState::INITIAL);
        assert_eq!(enc.packed >> 60, 0);
    }
}
