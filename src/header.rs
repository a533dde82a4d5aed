//! Fixed-size stream header: build, validate, and mode detection.

use std::mem;

use crate::error::Error;

/// First bytes of every chunk stream.
pub const SIGNATURE: [u8; 4] = [0x1b, b'L', b'y', b'r'];
/// Chunk format version understood by this crate.
pub const VERSION: u8 = 0x12;
/// Format byte of native-layout chunks.
pub const FORMAT_NATIVE: u8 = 0;
/// Format byte of portable-layout chunks.
pub const FORMAT_PORTABLE: u8 = 0x66;
/// Total size of the fixed stream header.
pub const HEADER_SIZE: usize = 12;

/// Numbers are `f64`, never an integral (fixed-point) representation.
const NUMBER_INTEGRAL: u8 = 0;

/// Wire layout governing everything after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Scalars laid out exactly as the writing host holds them in
    /// memory: host widths, host byte order. Only loadable on a host
    /// with the same layout.
    Native,
    /// Fixed 4/8/4/8 byte widths, little-endian on the wire, loadable
    /// anywhere.
    Portable,
}

pub(crate) fn host_is_little_endian() -> bool {
    1i32.to_ne_bytes()[0] == 1
}

/// Header advertising this host's own scalar layout (native mode).
pub fn native_header() -> [u8; HEADER_SIZE] {
    let mut h = [0u8; HEADER_SIZE];
    h[..4].copy_from_slice(&SIGNATURE);
    h[4] = VERSION;
    h[5] = FORMAT_NATIVE;
    h[6] = host_is_little_endian() as u8;
    h[7] = mem::size_of::<i32>() as u8;
    h[8] = mem::size_of::<usize>() as u8;
    h[9] = mem::size_of::<u32>() as u8;
    h[10] = mem::size_of::<f64>() as u8;
    h[11] = NUMBER_INTEGRAL;
    h
}

/// Header of the canonical portable layout, identical on every host.
///
/// The endianness and width bytes are declarations, not instructions:
/// portable payloads are already normalized by the writer, so the
/// loader only ever compares these bytes, never interprets them.
pub fn portable_header() -> [u8; HEADER_SIZE] {
    let mut h = [0u8; HEADER_SIZE];
    h[..4].copy_from_slice(&SIGNATURE);
    h[4] = VERSION;
    h[5] = FORMAT_PORTABLE;
    h[6] = 1; // canonical little-endian
    h[7] = 4; // int
    h[8] = 8; // size value
    h[9] = 4; // instruction word
    h[10] = 8; // number
    h[11] = NUMBER_INTEGRAL;
    h
}

/// Decides which decode strategy a stream uses from its first
/// [`HEADER_SIZE`] bytes.
///
/// The stream must match the locally built portable header or, failing
/// that, the locally built native header byte-for-byte. Any other
/// sequence (wrong signature, wrong version, foreign native layout,
/// unknown format byte) is [`Error::BadHeader`].
pub fn check_header(h: &[u8; HEADER_SIZE]) -> Result<Mode, Error> {
    if *h == portable_header() {
        Ok(Mode::Portable)
    } else if *h == native_header() {
        Ok(Mode::Native)
    } else {
        Err(Error::BadHeader)
    }
}
