//! Scalar wire strategies.
//!
//! One strategy value is chosen per dump/load call from the stream mode
//! and handed explicitly through the recursive walkers. The only shared
//! state in the crate is the memoized float-format probe below; both
//! racing initializers compute the same deterministic answer, so the
//! one-time initialization is safe.

use std::mem;
use std::sync::OnceLock;

use crate::error::Error;
use crate::header::Mode;

/// A double whose encoding exercises every byte position.
const PROBE_VALUE: f64 = 1.2344999991522893623141499119810760021209716796875;

/// In-memory bytes of [`PROBE_VALUE`] on a little-endian IEEE-754 host.
const PROBE_LE: [u8; 8] = [0x78, 0x56, 0x34, 0x12, 0x83, 0xC0, 0xF3, 0x3F];

/// Scalar encode/decode contract shared by both wire modes.
///
/// Widths are fixed per strategy; the walkers write or read exactly
/// `*_width()` bytes per scalar through 8-byte stack buffers. Sign and
/// range checks on decoded values belong to the callers — a strategy
/// only converts representations.
pub(crate) trait Scalars {
    fn int_width(&self) -> usize;
    fn size_width(&self) -> usize;
    fn number_width(&self) -> usize;
    fn code_width(&self) -> usize;

    /// Encode into the head of `out`, returning the byte count written.
    fn put_int(&self, x: i32, out: &mut [u8; 8]) -> usize;
    fn put_size(&self, x: u64, out: &mut [u8; 8]) -> usize;
    fn put_number(&self, x: f64, out: &mut [u8; 8]) -> usize;
    fn put_code(&self, x: u32, out: &mut [u8; 8]) -> usize;

    /// Decode from exactly `*_width()` bytes.
    fn get_int(&self, raw: &[u8]) -> i32;
    fn get_size(&self, raw: &[u8]) -> u64;
    fn get_number(&self, raw: &[u8]) -> f64;
    fn get_code(&self, raw: &[u8]) -> u32;
}

/// Builds the strategy for `mode`.
///
/// The portable strategy runs the float-format probe up front, so an
/// unsupported host fails before a single byte is coded.
pub(crate) fn scalars_for(mode: Mode) -> Result<Box<dyn Scalars>, Error> {
    match mode {
        Mode::Native => Ok(Box::new(NativeScalars)),
        Mode::Portable => Ok(Box::new(PortableScalars::for_host()?)),
    }
}

// ── native mode ─────────────────────────────────────────────────────────────

/// Host layout, byte-for-byte: host widths, host byte order.
pub(crate) struct NativeScalars;

impl Scalars for NativeScalars {
    fn int_width(&self) -> usize {
        mem::size_of::<i32>()
    }
    fn size_width(&self) -> usize {
        mem::size_of::<usize>()
    }
    fn number_width(&self) -> usize {
        mem::size_of::<f64>()
    }
    fn code_width(&self) -> usize {
        mem::size_of::<u32>()
    }

    fn put_int(&self, x: i32, out: &mut [u8; 8]) -> usize {
        let b = x.to_ne_bytes();
        out[..b.len()].copy_from_slice(&b);
        b.len()
    }
    fn put_size(&self, x: u64, out: &mut [u8; 8]) -> usize {
        let b = (x as usize).to_ne_bytes();
        out[..b.len()].copy_from_slice(&b);
        b.len()
    }
    fn put_number(&self, x: f64, out: &mut [u8; 8]) -> usize {
        let b = x.to_ne_bytes();
        out[..b.len()].copy_from_slice(&b);
        b.len()
    }
    fn put_code(&self, x: u32, out: &mut [u8; 8]) -> usize {
        let b = x.to_ne_bytes();
        out[..b.len()].copy_from_slice(&b);
        b.len()
    }

    fn get_int(&self, raw: &[u8]) -> i32 {
        i32::from_ne_bytes(raw.try_into().unwrap())
    }
    fn get_size(&self, raw: &[u8]) -> u64 {
        usize::from_ne_bytes(raw.try_into().unwrap()) as u64
    }
    fn get_number(&self, raw: &[u8]) -> f64 {
        f64::from_ne_bytes(raw.try_into().unwrap())
    }
    fn get_code(&self, raw: &[u8]) -> u32 {
        u32::from_ne_bytes(raw.try_into().unwrap())
    }
}

// ── portable mode ───────────────────────────────────────────────────────────

/// Canonical fixed-width little-endian layout.
///
/// Values pass through at host byte order and are reversed when `swap`
/// is set, so a big-endian writer and a little-endian writer emit the
/// same bytes. In production `swap` mirrors the host probe; tests
/// construct it by hand to simulate a foreign host.
pub(crate) struct PortableScalars {
    pub(crate) swap: bool,
}

impl PortableScalars {
    /// Strategy for this host. Fails with [`Error::UnknownNumberFormat`]
    /// when the float probe recognizes neither IEEE byte order.
    pub(crate) fn for_host() -> Result<Self, Error> {
        Ok(PortableScalars {
            swap: number_format_swaps()?,
        })
    }

    fn put8(&self, mut b: [u8; 8], out: &mut [u8; 8]) -> usize {
        if self.swap {
            b.reverse();
        }
        *out = b;
        8
    }

    fn put4(&self, mut b: [u8; 4], out: &mut [u8; 8]) -> usize {
        if self.swap {
            b.reverse();
        }
        out[..4].copy_from_slice(&b);
        4
    }

    fn get8(&self, raw: &[u8]) -> [u8; 8] {
        let mut b: [u8; 8] = raw.try_into().unwrap();
        if self.swap {
            b.reverse();
        }
        b
    }

    fn get4(&self, raw: &[u8]) -> [u8; 4] {
        let mut b: [u8; 4] = raw.try_into().unwrap();
        if self.swap {
            b.reverse();
        }
        b
    }
}

impl Scalars for PortableScalars {
    fn int_width(&self) -> usize {
        4
    }
    fn size_width(&self) -> usize {
        8
    }
    fn number_width(&self) -> usize {
        8
    }
    fn code_width(&self) -> usize {
        4
    }

    fn put_int(&self, x: i32, out: &mut [u8; 8]) -> usize {
        self.put4(x.to_ne_bytes(), out)
    }
    fn put_size(&self, x: u64, out: &mut [u8; 8]) -> usize {
        self.put8(x.to_ne_bytes(), out)
    }
    fn put_number(&self, x: f64, out: &mut [u8; 8]) -> usize {
        self.put8(x.to_ne_bytes(), out)
    }
    fn put_code(&self, x: u32, out: &mut [u8; 8]) -> usize {
        self.put4(x.to_ne_bytes(), out)
    }

    fn get_int(&self, raw: &[u8]) -> i32 {
        i32::from_ne_bytes(self.get4(raw))
    }
    fn get_size(&self, raw: &[u8]) -> u64 {
        u64::from_ne_bytes(self.get8(raw))
    }
    fn get_number(&self, raw: &[u8]) -> f64 {
        f64::from_ne_bytes(self.get8(raw))
    }
    fn get_code(&self, raw: &[u8]) -> u32 {
        u32::from_ne_bytes(self.get4(raw))
    }
}

/// Probes the host's in-memory `f64` layout, once per process.
///
/// Returns whether portable values need a byte reversal (true on
/// big-endian IEEE hosts), or [`Error::UnknownNumberFormat`] when the
/// probe pattern matches neither byte order.
fn number_format_swaps() -> Result<bool, Error> {
    static PROBE: OnceLock<Option<bool>> = OnceLock::new();
    let swap = PROBE.get_or_init(|| {
        let raw = PROBE_VALUE.to_ne_bytes();
        if raw == PROBE_LE {
            Some(false)
        } else if raw.iter().rev().eq(PROBE_LE.iter()) {
            Some(true)
        } else {
            None
        }
    });
    swap.ok_or(Error::UnknownNumberFormat)
}
