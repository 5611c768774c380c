//! # ilscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the ilscope library. Import this module to get quick access to everything needed to
//! decode and render a method body.
//!
//! ```rust
//! use ilscope::prelude::*;
//! use std::sync::Arc;
//!
//! let mut decoder = Decoder::new(vec![0x2A], Arc::new(ScopeTokenResolver::new()));
//! assert_eq!(decoder.lines()?, vec!["IL_0000: ret        "]);
//! # Ok::<(), ilscope::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ilscope operations
pub use crate::Error;

/// The result type used throughout ilscope
pub use crate::Result;

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type and its table classification
pub use crate::metadata::{Token, TokenKind};

/// Resolved entities
pub use crate::metadata::{FieldInfo, Member, MethodInfo, TypeInfo};

/// Token resolution contract and the dynamic method scope implementation
pub use crate::metadata::{ScopeEntry, ScopeTokenResolver, TokenResolver};

// ================================================================================================
// Disassembler
// ================================================================================================

/// Instruction decoding
pub use crate::disassembler::{decode_instruction, Decoder, DecoderState, Instruction, Operand};

/// Opcode tables
pub use crate::disassembler::{OpCode, OperandShape};

/// Rendering
pub use crate::disassembler::{DefaultFormatProvider, FormatProvider};

/// Method body extraction and batch rendering
pub use crate::disassembler::{render_batch, MethodBody, MethodBodySource, MethodJob};
