use thiserror::Error;

/// Everything that can fail while dumping or loading a precompiled chunk.
///
/// Every variant is fatal to the call that raised it: the codec never
/// retries internally, never resumes a failed write sequence, and never
/// returns a partially decoded tree.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad header in precompiled chunk — the stream does not start with a recognized chunk header")]
    BadHeader,

    #[error("unexpected end in precompiled chunk — the byte source ran out before a field was fully read")]
    UnexpectedEnd,

    #[error("bad integer in precompiled chunk — a count or length field decoded to a negative value")]
    BadInteger,

    #[error("bad string in precompiled chunk — string bytes are not valid UTF-8")]
    BadString,

    #[error("bad constant in precompiled chunk — unrecognized constant tag 0x{tag:02x}")]
    BadConstant { tag: u8 },

    #[error("bad code in precompiled chunk — the bytecode validator rejected a function body")]
    BadCode,

    #[error("code too deep in precompiled chunk — function nesting exceeds the limit of {limit}")]
    TooDeep { limit: usize },

    #[error("unknown number format — this host's floating representation is not IEEE-754, so it cannot read or write portable chunks")]
    UnknownNumberFormat,

    #[error("write failed — the byte sink reported an error")]
    WriteFailed(#[source] std::io::Error),
}
