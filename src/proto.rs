//! In-memory representation of a compiled function tree.

/// Wire tag for a nil constant.
pub(crate) const TAG_NIL: u8 = 0;
/// Wire tag for a boolean constant.
pub(crate) const TAG_BOOLEAN: u8 = 1;
/// Wire tag for a number constant.
///
/// Tag 2 belongs to a runtime-only value kind and never appears in a
/// constant table.
pub(crate) const TAG_NUMBER: u8 = 3;
/// Wire tag for a string constant.
pub(crate) const TAG_STRING: u8 = 4;

/// A compiled function unit ("prototype").
///
/// Produced once by the compiler front end, executed by the interpreter,
/// and carried across machines by [`dump`](crate::dump())/
/// [`undump`](crate::undump()). The codec treats `code` as opaque 32-bit
/// words; instruction semantics live in the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub struct Proto {
    /// Origin of the function (file or chunk name). Omitted on the wire
    /// when stripped or when identical to the enclosing function's source.
    pub source: Option<String>,
    /// First source line of the function body; 0 for a top-level chunk.
    pub line_defined: i32,
    /// Last source line of the function body; 0 for a top-level chunk.
    pub last_line_defined: i32,
    pub num_upvalues: u8,
    pub num_params: u8,
    pub is_vararg: u8,
    pub max_stack_size: u8,
    /// The bytecode itself, one fixed-width word per instruction.
    pub code: Vec<u32>,
    pub constants: Vec<Constant>,
    /// Functions defined inside this one.
    pub children: Vec<Proto>,
    /// Source line per instruction, same length as `code`. Empty when
    /// debug information is stripped.
    pub line_info: Vec<i32>,
    /// Live ranges of named locals. Empty when stripped.
    pub local_vars: Vec<LocalVar>,
    /// Names of the function's upvalues. Empty when stripped.
    pub upvalue_names: Vec<Option<String>>,
}

impl Proto {
    pub fn new() -> Self {
        Proto {
            source: None,
            line_defined: 0,
            last_line_defined: 0,
            num_upvalues: 0,
            num_params: 0,
            is_vararg: 0,
            max_stack_size: 0,
            code: Vec::new(),
            constants: Vec::new(),
            children: Vec::new(),
            line_info: Vec::new(),
            local_vars: Vec::new(),
            upvalue_names: Vec::new(),
        }
    }
}

impl Default for Proto {
    fn default() -> Self {
        Self::new()
    }
}

/// A value in a function's constant table.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Nil,
    Boolean(bool),
    Number(f64),
    Str(String),
}

impl Constant {
    /// The tag byte written before this constant's payload.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Constant::Nil => TAG_NIL,
            Constant::Boolean(_) => TAG_BOOLEAN,
            Constant::Number(_) => TAG_NUMBER,
            Constant::Str(_) => TAG_STRING,
        }
    }
}

/// Debug record for one local variable's live range.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: Option<String>,
    /// First instruction where the variable is active.
    pub start_pc: i32,
    /// First instruction where the variable is dead.
    pub end_pc: i32,
}
