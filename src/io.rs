//! Byte-stream collaborators consumed by the codec.
//!
//! The codec itself owns no I/O: the dumper pushes blocks through a
//! [`ChunkSink`] and the loader pulls exact-sized blocks from a
//! [`ChunkSource`]. Both traits have blanket impls for the std I/O
//! traits, so a `Vec<u8>`, a `File`, or a `&[u8]` slice works directly.

use std::io;

use crate::error::Error;
use crate::proto::Proto;

/// Push-style byte sink the dumper writes through.
///
/// Called once per primitive or block, in stream order. After the first
/// reported failure the dumper issues no further calls and returns
/// [`Error::WriteFailed`]; writes are never retried.
pub trait ChunkSink {
    fn write_block(&mut self, block: &[u8]) -> io::Result<()>;
}

impl<W: io::Write> ChunkSink for W {
    fn write_block(&mut self, block: &[u8]) -> io::Result<()> {
        self.write_all(block)
    }
}

/// Pull-style byte source the loader reads from.
///
/// `read_block` fills `buf` exactly; a short read is always
/// [`Error::UnexpectedEnd`], never partial success.
pub trait ChunkSource {
    fn read_block(&mut self, buf: &mut [u8]) -> Result<(), Error>;
}

impl<R: io::Read> ChunkSource for R {
    fn read_block(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.read_exact(buf).map_err(|_| Error::UnexpectedEnd)
    }
}

/// Bytecode validity check, run once per decoded function.
///
/// The loader invokes this after a node's fields are fully populated;
/// `false` aborts the load with [`Error::BadCode`]. Instruction
/// semantics stay outside the codec, so the check itself is supplied by
/// the interpreter side.
pub trait CodeValidator {
    fn check_code(&self, proto: &Proto) -> bool;
}
