//! Binary codec for precompiled Lyra chunks.
//!
//! A compiled function tree ([`Proto`]) is produced once by the
//! compiler front end; this crate writes it to a byte stream and
//! rebuilds an equivalent tree later, possibly on a different machine,
//! without recompilation.
//!
//! ## Wire format
//!
//! ```text
//! header (12 bytes):
//!   \x1bLyr | version | format | endianness
//!   | int width | size width | instr width | number width | integral flag
//! body, one function, depth first:
//!   source(string) | line_defined(int) | last_line_defined(int)
//!   | num_upvalues | num_params | is_vararg | max_stack_size   (raw bytes)
//!   | code(count + instruction words)
//!   | constants(count, then tag byte + payload each)
//!   | children(count, then nested functions)
//!   | line_info(count + ints)
//!   | local_vars(count + {name, start_pc, end_pc})
//!   | upvalue_names(count + strings)
//! ```
//!
//! Strings are length-prefixed with a trailing terminator included in
//! the length; length 0 is the absent value. A child whose source
//! equals its parent's is written absent and reconstructed on load.
//!
//! ## Wire modes
//!
//! `format = 0` (native) lays every scalar out exactly as the writing
//! host holds it in memory: host widths, host byte order. `format =
//! 0x66` (portable) uses fixed 4/8/4/8 widths, little-endian, and loads
//! on any host. The loader detects the mode by comparing the stream
//! header against both locally built candidates, picks the matching
//! scalar strategy once, and applies it through the whole recursive
//! decode — while never trusting stream counts or lengths with memory
//! safety.

pub mod dump;
pub mod error;
pub mod header;
pub mod io;
pub mod load;
pub mod proto;
mod wire;

pub use dump::{dump, dump_to_vec};
pub use error::Error;
pub use header::{Mode, HEADER_SIZE};
pub use io::{ChunkSink, ChunkSource, CodeValidator};
pub use load::{undump, undump_bytes, MAX_LOAD_DEPTH};
pub use proto::{Constant, LocalVar, Proto};
