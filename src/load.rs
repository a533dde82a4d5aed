//! Recursive chunk decoder.
//!
//! Mirrors the encoder walk field for field. Counts and lengths come
//! from the stream and are never trusted: negative counts fail fast,
//! vector elements are read through a fixed stack buffer so a hostile
//! count cannot force a giant allocation, and nesting depth is capped.

use crate::error::Error;
use crate::header::{check_header, HEADER_SIZE};
use crate::io::{ChunkSource, CodeValidator};
use crate::proto::{Constant, LocalVar, Proto, TAG_BOOLEAN, TAG_NIL, TAG_NUMBER, TAG_STRING};
use crate::wire::{scalars_for, Scalars};

/// Deepest function nesting `undump` rebuilds before failing with
/// [`Error::TooDeep`]. Protects the host stack from adversarial
/// streams, independent of any limit the compiler enforces while
/// dumping.
pub const MAX_LOAD_DEPTH: usize = 200;

/// Source name given to a root function whose own source was stripped.
const UNKNOWN_SOURCE: &str = "=?";

/// Cap on speculative `Vec` preallocation from stream-supplied counts.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Decoder state for one `undump` call.
struct Loader<'a, R: ChunkSource> {
    source: &'a mut R,
    wire: Box<dyn Scalars>,
    validator: Option<&'a dyn CodeValidator>,
    depth: usize,
}

impl<R: ChunkSource> Loader<'_, R> {
    fn block(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.source.read_block(buf)
    }

    fn byte(&mut self) -> Result<u8, Error> {
        let mut b = [0u8; 1];
        self.block(&mut b)?;
        Ok(b[0])
    }

    /// Reads one int and rejects negatives. Every directly loaded int
    /// on the wire is a count, length, line number, or pc — all
    /// non-negative by construction.
    fn int(&mut self) -> Result<i32, Error> {
        let w = self.wire.int_width();
        let mut raw = [0u8; 8];
        self.block(&mut raw[..w])?;
        let x = self.wire.get_int(&raw[..w]);
        if x < 0 {
            return Err(Error::BadInteger);
        }
        Ok(x)
    }

    fn size(&mut self) -> Result<u64, Error> {
        let w = self.wire.size_width();
        let mut raw = [0u8; 8];
        self.block(&mut raw[..w])?;
        Ok(self.wire.get_size(&raw[..w]))
    }

    fn number(&mut self) -> Result<f64, Error> {
        let w = self.wire.number_width();
        let mut raw = [0u8; 8];
        self.block(&mut raw[..w])?;
        Ok(self.wire.get_number(&raw[..w]))
    }

    /// Reads `n` raw bytes, growing the buffer only as the source
    /// actually delivers data, so a hostile length cannot reserve
    /// gigabytes up front.
    fn bytes(&mut self, n: u64) -> Result<Vec<u8>, Error> {
        const STEP: u64 = 64 * 1024;
        let mut out = Vec::with_capacity(n.min(STEP) as usize);
        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(STEP) as usize;
            let start = out.len();
            out.resize(start + step, 0);
            self.block(&mut out[start..])?;
            remaining -= step as u64;
        }
        Ok(out)
    }

    /// Inverse of the encoder's string form: length 0 is the absent
    /// value and consumes nothing further; otherwise the stored bytes
    /// include a trailing terminator that is dropped here.
    fn string(&mut self) -> Result<Option<String>, Error> {
        let size = self.size()?;
        if size == 0 {
            return Ok(None);
        }
        let mut bytes = self.bytes(size)?;
        bytes.pop();
        let s = String::from_utf8(bytes).map_err(|_| Error::BadString)?;
        Ok(Some(s))
    }

    fn code_vector(&mut self) -> Result<Vec<u32>, Error> {
        let n = self.int()? as usize;
        let w = self.wire.code_width();
        let mut code = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        let mut raw = [0u8; 8];
        for _ in 0..n {
            self.block(&mut raw[..w])?;
            code.push(self.wire.get_code(&raw[..w]));
        }
        Ok(code)
    }

    /// Vector elements are plain ints, not counts, so they may be
    /// negative; only the prefix count is sign-checked.
    fn int_vector(&mut self) -> Result<Vec<i32>, Error> {
        let n = self.int()? as usize;
        let w = self.wire.int_width();
        let mut xs = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        let mut raw = [0u8; 8];
        for _ in 0..n {
            self.block(&mut raw[..w])?;
            xs.push(self.wire.get_int(&raw[..w]));
        }
        Ok(xs)
    }

    fn constants(&mut self, f: &mut Proto) -> Result<(), Error> {
        let n = self.int()? as usize;
        f.constants = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        for _ in 0..n {
            let tag = self.byte()?;
            let k = match tag {
                TAG_NIL => Constant::Nil,
                TAG_BOOLEAN => Constant::Boolean(self.byte()? != 0),
                TAG_NUMBER => Constant::Number(self.number()?),
                TAG_STRING => Constant::Str(self.string()?.unwrap_or_default()),
                tag => return Err(Error::BadConstant { tag }),
            };
            f.constants.push(k);
        }
        let n = self.int()? as usize;
        f.children = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        let inherited = f.source.clone();
        for _ in 0..n {
            let child = self.function(inherited.as_deref())?;
            f.children.push(child);
        }
        Ok(())
    }

    fn debug(&mut self, f: &mut Proto) -> Result<(), Error> {
        f.line_info = self.int_vector()?;
        let n = self.int()? as usize;
        f.local_vars = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        for _ in 0..n {
            let name = self.string()?;
            let start_pc = self.int()?;
            let end_pc = self.int()?;
            f.local_vars.push(LocalVar {
                name,
                start_pc,
                end_pc,
            });
        }
        let n = self.int()? as usize;
        f.upvalue_names = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        for _ in 0..n {
            let name = self.string()?;
            f.upvalue_names.push(name);
        }
        Ok(())
    }

    fn function(&mut self, inherited: Option<&str>) -> Result<Proto, Error> {
        if self.depth >= MAX_LOAD_DEPTH {
            return Err(Error::TooDeep {
                limit: MAX_LOAD_DEPTH,
            });
        }
        self.depth += 1;
        let f = self.function_body(inherited);
        self.depth -= 1;
        f
    }

    fn function_body(&mut self, inherited: Option<&str>) -> Result<Proto, Error> {
        let mut f = Proto::new();
        f.source = match self.string()? {
            Some(s) => Some(s),
            None => inherited.map(str::to_owned),
        };
        f.line_defined = self.int()?;
        f.last_line_defined = self.int()?;
        f.num_upvalues = self.byte()?;
        f.num_params = self.byte()?;
        f.is_vararg = self.byte()?;
        f.max_stack_size = self.byte()?;
        f.code = self.code_vector()?;
        self.constants(&mut f)?;
        self.debug(&mut f)?;
        if let Some(v) = self.validator {
            if !v.check_code(&f) {
                return Err(Error::BadCode);
            }
        }
        Ok(f)
    }
}

/// Reads one precompiled chunk from `source` and rebuilds its function
/// tree.
///
/// The stream header decides whether the portable or the native decode
/// strategy applies; that strategy then governs the entire recursive
/// decode. When `validator` is given it runs once per decoded function
/// and can reject the chunk with [`Error::BadCode`]. Any failure
/// discards the partially built tree; no partial result ever escapes.
///
/// Exactly one top-level function and its descendants are consumed;
/// trailing bytes are left in the source and not diagnosed here.
pub fn undump<R: ChunkSource>(
    source: &mut R,
    validator: Option<&dyn CodeValidator>,
) -> Result<Proto, Error> {
    let mut header = [0u8; HEADER_SIZE];
    source.read_block(&mut header)?;
    let mode = check_header(&header)?;
    let wire = scalars_for(mode)?;
    let mut loader = Loader {
        source,
        wire,
        validator,
        depth: 0,
    };
    loader.function(Some(UNKNOWN_SOURCE))
}

/// Rebuilds a function tree from an in-memory chunk image.
pub fn undump_bytes(
    mut data: &[u8],
    validator: Option<&dyn CodeValidator>,
) -> Result<Proto, Error> {
    undump(&mut data, validator)
}
