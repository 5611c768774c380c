//! CIL instruction decoding.
//!
//! [`Decoder`] walks one method body from offset 0 to its end, producing an [`Instruction`] per
//! opcode. It is a plain [`Iterator`] and is restartable: once the end of the buffer is reached
//! (or decoding aborted on corrupt bytes) the next call to [`Iterator::next`] returns `None` and
//! rewinds the cursor, so the same decoder can be iterated again and yields the same sequence.
//!
//! Decoding is strict. An opcode byte that is not part of the instruction set is reported as
//! [`crate::Error::Malformed`] and an operand that runs past the end of the buffer as
//! [`crate::Error::OutOfBounds`]; there is no attempt to resynchronize after either. Tokens are
//! never resolved here, so a broken resolver cannot make decoding fail.
//!
//! # Example: Decoding a Single Instruction
//!
//! ```rust
//! use ilscope::{
//!     disassembler::{decode_instruction, DefaultFormatProvider, FormatProvider},
//!     metadata::{ScopeTokenResolver, TokenResolver},
//! };
//! use std::sync::Arc;
//!
//! let resolver: Arc<dyn TokenResolver> = Arc::new(ScopeTokenResolver::new());
//! let format: Arc<dyn FormatProvider> = Arc::new(DefaultFormatProvider);
//!
//! let code = [0x00, 0x2A]; // nop, ret
//! let mut cursor = 1;
//! let instruction = decode_instruction(&code, &mut cursor, &resolver, &format)?;
//!
//! assert_eq!(instruction.opcode().name, "ret");
//! assert_eq!(instruction.offset(), 1);
//! assert_eq!(cursor, 2);
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! # Example: Rendering a Method Body
//!
//! ```rust
//! use ilscope::{disassembler::Decoder, metadata::ScopeTokenResolver};
//! use std::sync::Arc;
//!
//! let scope = ScopeTokenResolver::new();
//! let hello = scope.add_string("Hello");
//!
//! let mut body = vec![0x72];
//! body.extend_from_slice(&hello.value().to_le_bytes());
//! body.extend_from_slice(&[0x26, 0x2A]); // pop, ret
//!
//! let mut decoder = Decoder::new(body, Arc::new(scope));
//! assert_eq!(
//!     decoder.text()?,
//!     "IL_0000: ldstr      \"Hello\"\nIL_0005: pop        \nIL_0006: ret        \n"
//! );
//! # Ok::<(), ilscope::Error>(())
//! ```

use std::sync::Arc;

use crate::{
    disassembler::{
        body::{MethodBody, MethodBodySource},
        format::{DefaultFormatProvider, FormatProvider},
        instruction::{Instruction, Operand},
        opcodes::{one_byte, two_byte, OperandShape, TWO_BYTE_ESCAPE},
    },
    file::io::read_le_at,
    metadata::{Token, TokenResolver},
    Result,
};

/// Where a [`Decoder`] is in its pass over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Positioned at offset 0, nothing decoded yet
    Ready,
    /// At least one instruction decoded, more bytes remain
    Decoding,
    /// The pass ended, either at the end of the buffer or on a fatal error. The next call to
    /// `next()` yields `None` and rewinds to [`DecoderState::Ready`]
    Exhausted,
}

/// A restartable, lazy instruction iterator over one method body.
///
/// Iteration borrows the decoder mutably, so a single decoder can never be walked by two threads
/// at once. Independent decoders can run in parallel; they share only the opcode tables and
/// whatever resolver they were given.
pub struct Decoder {
    bytes: Arc<[u8]>,
    cursor: usize,
    state: DecoderState,
    resolver: Arc<dyn TokenResolver>,
    format: Arc<dyn FormatProvider>,
    fixup_success: bool,
}

impl Decoder {
    /// Creates a decoder over `bytes`, resolving tokens through `resolver` and rendering with
    /// [`DefaultFormatProvider`].
    ///
    /// ## Arguments
    /// * 'bytes'    - The method body, starting with its first opcode
    /// * 'resolver' - Resolves the tokens embedded in the body
    pub fn new(bytes: impl Into<Arc<[u8]>>, resolver: Arc<dyn TokenResolver>) -> Self {
        Decoder {
            bytes: bytes.into(),
            cursor: 0,
            state: DecoderState::Ready,
            resolver,
            format: Arc::new(DefaultFormatProvider),
            fixup_success: true,
        }
    }

    /// Creates a decoder over the body a code generator produced.
    ///
    /// The body is obtained through [`MethodBody::extract`]; whether the fallback path was taken
    /// is available afterwards from [`Decoder::fixup_success`].
    pub fn from_source<S: MethodBodySource + ?Sized>(
        source: &S,
        resolver: Arc<dyn TokenResolver>,
    ) -> Self {
        let body = MethodBody::extract(source);
        let fixup_success = body.fixup_success();

        Decoder {
            fixup_success,
            ..Decoder::new(body.into_bytes(), resolver)
        }
    }

    /// Replaces the format provider handed to every instruction decoded from now on.
    #[must_use]
    pub fn with_format_provider(mut self, format: Arc<dyn FormatProvider>) -> Self {
        self.format = format;
        self
    }

    /// Offset of the next opcode to decode
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Current state of the pass
    #[must_use]
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// The method body being decoded
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `false` if the body came from the fallback extraction path of [`Decoder::from_source`]
    #[must_use]
    pub fn fixup_success(&self) -> bool {
        self.fixup_success
    }

    /// Rewinds to offset 0.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = DecoderState::Ready;
    }

    /// Decodes the whole body from offset 0.
    ///
    /// # Errors
    /// Returns the first [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] encountered.
    pub fn decode_all(&mut self) -> Result<Vec<Instruction>> {
        self.reset();
        let instructions = self.by_ref().collect::<Result<Vec<_>>>();
        self.reset();

        instructions
    }

    /// Renders every instruction of the body as one line of text.
    ///
    /// Operands whose tokens do not resolve are rendered inline as error markers and do not
    /// fail the call.
    ///
    /// # Errors
    /// Returns the first fatal decoding error, see [`Decoder::decode_all`].
    pub fn lines(&mut self) -> Result<Vec<String>> {
        Ok(self
            .decode_all()?
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Renders the whole body as a single block, each line terminated by `\n`.
    ///
    /// # Errors
    /// Returns the first fatal decoding error, see [`Decoder::decode_all`].
    pub fn text(&mut self) -> Result<String> {
        let mut text = String::new();
        for line in self.lines()? {
            text.push_str(&line);
            text.push('\n');
        }

        Ok(text)
    }
}

impl Iterator for Decoder {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == DecoderState::Exhausted || self.cursor >= self.bytes.len() {
            if self.state != DecoderState::Ready {
                log::debug!("Decoder restarting after {} of {} bytes", self.cursor, self.bytes.len());
            }
            self.reset();
            return None;
        }

        match decode_instruction(&self.bytes, &mut self.cursor, &self.resolver, &self.format) {
            Ok(instruction) => {
                log::trace!(
                    "IL_{:04x}: {} ({} bytes)",
                    instruction.offset(),
                    instruction.opcode().name,
                    instruction.size()
                );

                self.state = if self.cursor >= self.bytes.len() {
                    DecoderState::Exhausted
                } else {
                    DecoderState::Decoding
                };
                Some(Ok(instruction))
            }
            Err(error) => {
                log::debug!("Decoding aborted at offset {}: {}", self.cursor, error);
                self.state = DecoderState::Exhausted;
                Some(Err(error))
            }
        }
    }
}

/// Decodes the instruction starting at `*cursor` and advances the cursor past it.
///
/// The cursor is left untouched on error.
///
/// ## Arguments
/// * 'bytes'    - The method body
/// * 'cursor'   - Offset of the opcode to decode
/// * 'resolver' - Bound to the instruction for lazy token resolution
/// * 'format'   - Bound to the instruction for rendering
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an opcode that matches neither opcode table or a
/// `switch` whose case count cannot fit in the buffer, and [`crate::Error::OutOfBounds`] for a
/// truncated opcode or operand.
pub fn decode_instruction(
    bytes: &[u8],
    cursor: &mut usize,
    resolver: &Arc<dyn TokenResolver>,
    format: &Arc<dyn FormatProvider>,
) -> Result<Instruction> {
    let offset = *cursor;
    let mut pos = offset;

    let first_byte = read_le_at::<u8>(bytes, &mut pos)?;
    let opcode = if first_byte == TWO_BYTE_ESCAPE {
        let second_byte = read_le_at::<u8>(bytes, &mut pos)?;
        match two_byte(second_byte) {
            Some(opcode) => opcode,
            None => return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte)),
        }
    } else {
        match one_byte(first_byte) {
            Some(opcode) => opcode,
            None => return Err(malformed_error!("Invalid opcode: {:02X}", first_byte)),
        }
    };

    let operand = match opcode.shape {
        OperandShape::None => Operand::None,
        OperandShape::ShortBranch => Operand::ShortBranch(read_le_at::<i8>(bytes, &mut pos)?),
        OperandShape::Branch => Operand::Branch(read_le_at::<i32>(bytes, &mut pos)?),
        OperandShape::ShortInt => Operand::ShortInt(read_le_at::<u8>(bytes, &mut pos)?),
        OperandShape::Int => Operand::Int(read_le_at::<i32>(bytes, &mut pos)?),
        OperandShape::LongInt => Operand::LongInt(read_le_at::<i64>(bytes, &mut pos)?),
        OperandShape::ShortFloat => Operand::ShortFloat(read_le_at::<f32>(bytes, &mut pos)?),
        OperandShape::Float => Operand::Float(read_le_at::<f64>(bytes, &mut pos)?),
        OperandShape::ShortVar => Operand::ShortVar(read_le_at::<u8>(bytes, &mut pos)?),
        OperandShape::Var => Operand::Var(read_le_at::<u16>(bytes, &mut pos)?),
        OperandShape::StringToken => Operand::StringToken(read_token(bytes, &mut pos)?),
        OperandShape::SignatureToken => Operand::SignatureToken(read_token(bytes, &mut pos)?),
        OperandShape::MethodToken => Operand::MethodToken(read_token(bytes, &mut pos)?),
        OperandShape::FieldToken => Operand::FieldToken(read_token(bytes, &mut pos)?),
        OperandShape::TypeToken => Operand::TypeToken(read_token(bytes, &mut pos)?),
        OperandShape::MemberToken => Operand::MemberToken(read_token(bytes, &mut pos)?),
        OperandShape::Switch => {
            let case_count = read_le_at::<u32>(bytes, &mut pos)? as usize;

            let remaining = bytes.len() - pos;
            if case_count > remaining / 4 {
                return Err(malformed_error!(
                    "Switch with {} cases does not fit in the remaining {} bytes",
                    case_count,
                    remaining
                ));
            }

            let mut deltas = Vec::with_capacity(case_count);
            for _ in 0..case_count {
                deltas.push(read_le_at::<i32>(bytes, &mut pos)?);
            }

            Operand::Switch(deltas)
        }
    };

    *cursor = pos;
    Ok(Instruction::new(
        offset,
        opcode,
        operand,
        Arc::clone(resolver),
        Arc::clone(format),
    ))
}

fn read_token(bytes: &[u8], pos: &mut usize) -> Result<Token> {
    Ok(Token::new(read_le_at::<u32>(bytes, pos)?))
}
