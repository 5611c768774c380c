//! CIL (Common Intermediate Language) bytecode disassembler.
//!
//! This module turns the raw bytecode of a single method body into decoded instructions and
//! renders them as text, one line per instruction:
//!
//! ```text
//! IL_0000: ldstr      "Hello"
//! IL_0005: call       System.Console::WriteLine(System.String)
//! IL_000a: ret
//! ```
//!
//! # Key Types
//! - [`Decoder`] - Restartable iterator over the instructions of one method body
//! - [`Instruction`] - A decoded instruction bound to its resolver and format provider
//! - [`Operand`] - The typed operand, one variant per [`OperandShape`]
//! - [`OpCode`] - An entry of the static opcode tables
//! - [`FormatProvider`] - Replaceable rendering conventions, [`DefaultFormatProvider`] by default
//! - [`MethodBody`] - Bytecode extracted from a [`MethodBodySource`]
//!
//! # Main Functions
//! - [`decode_instruction`] - Decode a single instruction at a cursor
//! - [`render_batch`] - Render many method bodies in parallel
//! - [`lookup`] / [`one_byte`] / [`two_byte`] / [`opcodes`] - Opcode table lookups
//!
//! # Example
//! ```rust
//! use ilscope::{disassembler::Decoder, metadata::ScopeTokenResolver};
//! use std::sync::Arc;
//!
//! let mut decoder = Decoder::new(vec![0x00, 0x2A], Arc::new(ScopeTokenResolver::new()));
//! for instruction in &mut decoder {
//!     println!("{}", instruction?);
//! }
//! # Ok::<(), ilscope::Error>(())
//! ```

mod batch;
mod body;
mod decoder;
mod format;
mod instruction;
mod opcodes;

pub use batch::{render_batch, MethodJob};
pub use body::{MethodBody, MethodBodySource};
pub use decoder::{decode_instruction, Decoder, DecoderState};
pub use format::{DefaultFormatProvider, FormatProvider};
pub use instruction::{Instruction, Operand};
pub use opcodes::{
    lookup, one_byte, opcodes, two_byte, OpCode, OperandShape, OPCODE_DEFINITIONS, TWO_BYTE_ESCAPE,
};
