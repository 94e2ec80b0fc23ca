//! Pure Rust codec core for [Quite OK Audio](https://qoaformat.org/) (QOA):
//! a lossy, fixed-bitrate, time-domain PCM codec built around a 4-tap
//! sign-sign LMS predictor and 3-bit quantized residuals packed into
//! 64-bit slices.
//!
//! This crate is the codec core only: it exchanges byte spans and
//! channel-interleaved `i16` sample spans with its caller. File I/O,
//! buffer allocation policy, and channel-label assignment (`FL`, `FR`, …)
//! are left to the host.

pub mod errors;
pub mod frame;
pub mod io;
pub mod lms;
pub mod slice;
pub mod stream;
pub(crate) mod tables;

pub use errors::Error;
pub use lms::LmsState;
pub use stream::{decode, decode_header, encode, encoded_size, HeaderInfo, StreamDescriptor};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// ASCII `qoaf`, the four magic bytes identifying a QOA file.
pub const QOA_MAGIC: u32 = 0x716f_6166;
/// Smallest possible valid file: an 8-byte file header plus an 8-byte
/// frame header.
pub const QOA_MIN_FILESIZE: usize = 16;
/// The format's implementation-defined channel cap (the wire header byte
/// can express up to 255; this codec rejects anything above 8).
pub const QOA_MAX_CHANNELS: u32 = 8;
/// Samples per slice.
pub const QOA_SLICE_LEN: usize = slice::SLICE_LEN;
/// Slices per full frame.
pub const QOA_SLICES_PER_FRAME: usize = 256;
/// Samples per channel covered by one full frame (`256 * 20`).
pub const QOA_FRAME_LEN: usize = QOA_SLICES_PER_FRAME * QOA_SLICE_LEN;
/// Taps in the LMS predictor.
pub const QOA_LMS_LEN: usize = lms::LMS_LEN;

/// Decodes exactly one frame out of `bytes` against `desc`'s channel
/// count and samplerate, writing reconstructed samples into `out_pcm`
/// (channel-interleaved, starting at sample-frame 0 of `out_pcm`).
///
/// Returns `(bytes_consumed, frame_len)`; `bytes_consumed == 0` would
/// signal failure, but this codec instead returns `Err` for every
/// rejection path, per [`errors::Error`].
pub fn decode_frame(
    bytes: &[u8],
    desc: &mut StreamDescriptor,
    out_pcm: &mut [i16],
) -> Result<(usize, usize)> {
    frame::decode_frame(bytes, desc.channels, desc.samplerate, &mut desc.lms, out_pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_spec() {
        assert_eq!(QOA_MAGIC, 0x716f_6166);
        assert_eq!(QOA_MIN_FILESIZE, 16);
        assert_eq!(QOA_MAX_CHANNELS, 8);
        assert_eq!(QOA_SLICE_LEN, 20);
        assert_eq!(QOA_SLICES_PER_FRAME, 256);
        assert_eq!(QOA_FRAME_LEN, 5120);
        assert_eq!(QOA_LMS_LEN, 4);
    }

    #[test]
    fn top_level_decode_frame_matches_frame_module() {
        let pcm = vec![0i16; 8];
        let mut desc = StreamDescriptor::new(1, 44100, 8);
        let bytes = encode(&pcm, &mut desc).unwrap();

        let mut fresh_desc = StreamDescriptor::new(1, 44100, 8);
        let mut out = vec![0i16; 8];
        let (consumed, fsamples) = decode_frame(&bytes[8..], &mut fresh_desc, &mut out).unwrap();
        assert_eq!(fsamples, 8);
        assert_eq!(consumed, bytes.len() - 8);
        assert_eq!(out, pcm);
    }
}
