//! Recursive chunk encoder.
//!
//! One depth-first walk over the function tree, in fixed schema order:
//! source, line range, the four byte-sized counts, code, constants
//! (recursing into nested functions), debug block. The same walk serves
//! both wire modes; the mode only decides the scalar strategy chosen at
//! entry.

use crate::error::Error;
use crate::header::{native_header, portable_header, Mode};
use crate::io::ChunkSink;
use crate::proto::{Constant, Proto};
use crate::wire::{scalars_for, Scalars};

/// Encoder state for one `dump` call.
struct Dumper<'a, S: ChunkSink> {
    sink: &'a mut S,
    wire: Box<dyn Scalars>,
    strip: bool,
}

impl<S: ChunkSink> Dumper<'_, S> {
    fn block(&mut self, b: &[u8]) -> Result<(), Error> {
        self.sink.write_block(b).map_err(Error::WriteFailed)
    }

    fn byte(&mut self, b: u8) -> Result<(), Error> {
        self.block(&[b])
    }

    fn int(&mut self, x: i32) -> Result<(), Error> {
        let mut raw = [0u8; 8];
        let n = self.wire.put_int(x, &mut raw);
        self.block(&raw[..n])
    }

    fn size(&mut self, x: u64) -> Result<(), Error> {
        let mut raw = [0u8; 8];
        let n = self.wire.put_size(x, &mut raw);
        self.block(&raw[..n])
    }

    fn number(&mut self, x: f64) -> Result<(), Error> {
        let mut raw = [0u8; 8];
        let n = self.wire.put_number(x, &mut raw);
        self.block(&raw[..n])
    }

    /// Length-prefixed string. `None` and the zero length share one wire
    /// form; a present string is stored with a trailing terminator that
    /// the length includes.
    fn string(&mut self, s: Option<&str>) -> Result<(), Error> {
        match s {
            None => self.size(0),
            Some(s) => {
                self.size(s.len() as u64 + 1)?;
                let mut bytes = Vec::with_capacity(s.len() + 1);
                bytes.extend_from_slice(s.as_bytes());
                bytes.push(0);
                self.block(&bytes)
            }
        }
    }

    /// Count-prefixed instruction words, converted element by element
    /// into a scratch buffer and written as one block. The scratch
    /// buffer lives exactly as long as this call, on every exit path.
    fn code_vector(&mut self, code: &[u32]) -> Result<(), Error> {
        self.int(code.len() as i32)?;
        let mut scratch = Vec::with_capacity(code.len() * self.wire.code_width());
        for &ins in code {
            let mut raw = [0u8; 8];
            let n = self.wire.put_code(ins, &mut raw);
            scratch.extend_from_slice(&raw[..n]);
        }
        self.block(&scratch)
    }

    fn int_vector(&mut self, xs: &[i32]) -> Result<(), Error> {
        self.int(xs.len() as i32)?;
        let mut scratch = Vec::with_capacity(xs.len() * self.wire.int_width());
        for &x in xs {
            let mut raw = [0u8; 8];
            let n = self.wire.put_int(x, &mut raw);
            scratch.extend_from_slice(&raw[..n]);
        }
        self.block(&scratch)
    }

    fn constants(&mut self, f: &Proto) -> Result<(), Error> {
        self.int(f.constants.len() as i32)?;
        for k in &f.constants {
            self.byte(k.tag())?;
            match k {
                Constant::Nil => {}
                Constant::Boolean(b) => self.byte(*b as u8)?,
                Constant::Number(n) => self.number(*n)?,
                Constant::Str(s) => self.string(Some(s))?,
            }
        }
        self.int(f.children.len() as i32)?;
        for child in &f.children {
            self.function(child, f.source.as_deref())?;
        }
        Ok(())
    }

    fn debug(&mut self, f: &Proto) -> Result<(), Error> {
        if self.strip {
            self.int_vector(&[])?;
            self.int(0)?;
            return self.int(0);
        }
        self.int_vector(&f.line_info)?;
        self.int(f.local_vars.len() as i32)?;
        for var in &f.local_vars {
            self.string(var.name.as_deref())?;
            self.int(var.start_pc)?;
            self.int(var.end_pc)?;
        }
        self.int(f.upvalue_names.len() as i32)?;
        for name in &f.upvalue_names {
            self.string(name.as_deref())?;
        }
        Ok(())
    }

    fn function(&mut self, f: &Proto, enclosing: Option<&str>) -> Result<(), Error> {
        // Elide the source when stripping, or when it repeats the
        // enclosing function's source (compared by content; only one
        // copy of a repeated name is ever written per branch).
        let source = match (&f.source, enclosing) {
            _ if self.strip => None,
            (Some(s), Some(p)) if s == p => None,
            (s, _) => s.as_deref(),
        };
        self.string(source)?;
        self.int(f.line_defined)?;
        self.int(f.last_line_defined)?;
        self.byte(f.num_upvalues)?;
        self.byte(f.num_params)?;
        self.byte(f.is_vararg)?;
        self.byte(f.max_stack_size)?;
        self.code_vector(&f.code)?;
        self.constants(f)?;
        self.debug(f)
    }
}

/// Serializes a function tree through `sink` in the given wire mode.
///
/// `strip` omits all debug information: source names, line info, local
/// variable names, and upvalue names. The first sink failure aborts the
/// dump with [`Error::WriteFailed`]; no further writes are attempted
/// and nothing is retried.
pub fn dump<S: ChunkSink>(
    proto: &Proto,
    sink: &mut S,
    mode: Mode,
    strip: bool,
) -> Result<(), Error> {
    // Select the strategy before touching the sink, so an unsupported
    // number format fails with zero bytes written.
    let wire = scalars_for(mode)?;
    let header = match mode {
        Mode::Native => native_header(),
        Mode::Portable => portable_header(),
    };
    let mut d = Dumper { sink, wire, strip };
    d.block(&header)?;
    d.function(proto, None)
}

/// Serializes a function tree into a fresh byte vector.
pub fn dump_to_vec(proto: &Proto, mode: Mode, strip: bool) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    dump(proto, &mut out, mode, strip)?;
    Ok(out)
}
