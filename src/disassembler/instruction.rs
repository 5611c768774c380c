//! Decoded CIL instructions and their operands.
//!
//! An [`Instruction`] pairs an offset and an [`OpCode`] with the typed [`Operand`] that followed
//! it in the bytecode. It also holds the [`TokenResolver`] and [`FormatProvider`] it was decoded
//! with, so it can render itself long after the [`crate::disassembler::Decoder`] is gone.
//!
//! Every instruction exposes two renderings of its operand:
//!
//! - [`Instruction::raw_operand`] - the encoded value as fixed-width hex, never fails
//! - [`Instruction::processed_operand`] - the human readable value (labels, decimal numbers,
//!   resolved names), which may fail when a token does not resolve
//!
//! Token resolution is lazy. Nothing is resolved while decoding; the resolver is consulted each
//! time processed text is requested, except for `calli` signatures whose bytes are fetched once
//! and then cached on the instruction.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::{disassembler::Decoder, metadata::ScopeTokenResolver};
//! use std::sync::Arc;
//!
//! // br.s +3
//! let mut decoder = Decoder::new(vec![0x2B, 0x03], Arc::new(ScopeTokenResolver::new()));
//! let instruction = decoder.next().unwrap()?;
//!
//! assert_eq!(instruction.size(), 2);
//! assert_eq!(instruction.target(), Some(5));
//! assert_eq!(instruction.raw_operand(), "03");
//! assert_eq!(instruction.processed_operand()?, "IL_0005");
//! assert_eq!(instruction.to_string(), "IL_0000: br.s       IL_0005");
//! # Ok::<(), ilscope::Error>(())
//! ```

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    disassembler::{
        format::FormatProvider,
        opcodes::{OpCode, OperandShape},
    },
    metadata::{Member, MethodInfo, Token, TokenResolver},
    Result,
};

/// The typed operand of an instruction, one variant per [`OperandShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// 8-bit signed branch delta
    ShortBranch(i8),
    /// 32-bit signed branch delta
    Branch(i32),
    /// 8-bit constant
    ShortInt(u8),
    /// 32-bit constant
    Int(i32),
    /// 64-bit constant
    LongInt(i64),
    /// Single precision constant
    ShortFloat(f32),
    /// Double precision constant
    Float(f64),
    /// 8-bit local or argument index
    ShortVar(u8),
    /// 16-bit local or argument index
    Var(u16),
    /// `ldstr` token
    StringToken(Token),
    /// `calli` signature token
    SignatureToken(Token),
    /// Method token
    MethodToken(Token),
    /// Field token
    FieldToken(Token),
    /// Type token
    TypeToken(Token),
    /// `ldtoken` operand naming a type, method or field
    MemberToken(Token),
    /// Jump table of 32-bit signed deltas
    Switch(Vec<i32>),
}

impl Operand {
    /// The shape this operand was decoded as
    #[must_use]
    pub fn shape(&self) -> OperandShape {
        match self {
            Operand::None => OperandShape::None,
            Operand::ShortBranch(_) => OperandShape::ShortBranch,
            Operand::Branch(_) => OperandShape::Branch,
            Operand::ShortInt(_) => OperandShape::ShortInt,
            Operand::Int(_) => OperandShape::Int,
            Operand::LongInt(_) => OperandShape::LongInt,
            Operand::ShortFloat(_) => OperandShape::ShortFloat,
            Operand::Float(_) => OperandShape::Float,
            Operand::ShortVar(_) => OperandShape::ShortVar,
            Operand::Var(_) => OperandShape::Var,
            Operand::StringToken(_) => OperandShape::StringToken,
            Operand::SignatureToken(_) => OperandShape::SignatureToken,
            Operand::MethodToken(_) => OperandShape::MethodToken,
            Operand::FieldToken(_) => OperandShape::FieldToken,
            Operand::TypeToken(_) => OperandShape::TypeToken,
            Operand::MemberToken(_) => OperandShape::MemberToken,
            Operand::Switch(_) => OperandShape::Switch,
        }
    }

    /// Number of bytes the operand occupies in the bytecode
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Operand::Switch(deltas) => 4 + deltas.len() * 4,
            other => other.shape().operand_size().unwrap_or(0),
        }
    }

    /// The metadata token, for the six token shapes
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            Operand::StringToken(token)
            | Operand::SignatureToken(token)
            | Operand::MethodToken(token)
            | Operand::FieldToken(token)
            | Operand::TypeToken(token)
            | Operand::MemberToken(token) => Some(*token),
            _ => None,
        }
    }
}

/// A single decoded instruction.
#[derive(Clone)]
pub struct Instruction {
    offset: usize,
    opcode: &'static OpCode,
    operand: Operand,
    resolver: Arc<dyn TokenResolver>,
    format: Arc<dyn FormatProvider>,
    signature: OnceLock<Vec<u8>>,
}

impl Instruction {
    /// Binds a decoded opcode and operand to a resolver and a format provider.
    pub(crate) fn new(
        offset: usize,
        opcode: &'static OpCode,
        operand: Operand,
        resolver: Arc<dyn TokenResolver>,
        format: Arc<dyn FormatProvider>,
    ) -> Self {
        debug_assert_eq!(opcode.shape, operand.shape());

        Instruction {
            offset,
            opcode,
            operand,
            resolver,
            format,
            signature: OnceLock::new(),
        }
    }

    /// Offset of the opcode's first byte within the method body
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The decoded opcode
    #[must_use]
    pub fn opcode(&self) -> &'static OpCode {
        self.opcode
    }

    /// The typed operand
    #[must_use]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Encoded length of the whole instruction, opcode bytes included
    #[must_use]
    pub fn size(&self) -> usize {
        self.opcode.size() + self.operand.size()
    }

    /// Absolute offset a branch instruction transfers control to.
    ///
    /// Deltas are relative to the end of the instruction. Returns `None` for anything but the two
    /// branch shapes.
    #[must_use]
    pub fn target(&self) -> Option<i64> {
        let delta = match self.operand {
            Operand::ShortBranch(delta) => i64::from(delta),
            Operand::Branch(delta) => i64::from(delta),
            _ => return None,
        };

        Some(self.end() + delta)
    }

    /// Absolute offsets of every case of a `switch`, or the single target of a branch.
    ///
    /// Empty for instructions that do not transfer control.
    #[must_use]
    pub fn targets(&self) -> Vec<i64> {
        match &self.operand {
            Operand::Switch(deltas) => {
                let end = self.end();
                deltas.iter().map(|&delta| end + i64::from(delta)).collect()
            }
            _ => self.target().into_iter().collect(),
        }
    }

    /// The metadata token carried by the operand, if any
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.operand.token()
    }

    /// Signature bytes of a `calli` operand.
    ///
    /// The resolver is asked on first use only; later calls return the cached bytes. A failed
    /// fetch is not cached.
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the operand is not a signature token or the
    /// resolver cannot resolve it.
    pub fn signature(&self) -> Result<&[u8]> {
        if let Some(signature) = self.signature.get() {
            return Ok(signature);
        }

        let Operand::SignatureToken(token) = self.operand else {
            return Err(crate::Error::Resolution {
                token: self.token().unwrap_or(Token(0)),
                expected: "signature",
            });
        };

        let signature = self.resolver.as_signature(token)?;
        Ok(self.signature.get_or_init(|| signature))
    }

    /// The operand as human readable text.
    ///
    /// # Errors
    /// Returns the resolver's error if the operand is a token that does not resolve.
    pub fn processed_operand(&self) -> Result<String> {
        let format = &*self.format;

        Ok(match &self.operand {
            Operand::None => String::new(),
            Operand::ShortBranch(_) | Operand::Branch(_) => {
                format.label(self.target().unwrap_or_default())
            }
            Operand::ShortInt(value) => value.to_string(),
            Operand::Int(value) => value.to_string(),
            Operand::LongInt(value) => value.to_string(),
            Operand::ShortFloat(value) => value.to_string(),
            Operand::Float(value) => value.to_string(),
            Operand::ShortVar(index) => format.argument(u16::from(*index)),
            Operand::Var(index) => format.argument(*index),
            Operand::StringToken(token) => format.escaped_string(&self.resolver.as_string(*token)?),
            Operand::SignatureToken(_) => format.signature_to_string(self.signature()?),
            Operand::MethodToken(token) => method_text(&self.resolver.as_method(*token)?),
            Operand::FieldToken(token) => {
                let field = self.resolver.as_field(*token)?;
                format!("{}/{}", field, field.declaring_type.as_deref().unwrap_or_default())
            }
            Operand::TypeToken(token) => self.resolver.as_type(*token)?.full_name,
            Operand::MemberToken(token) => {
                let member: Member = self.resolver.as_member(*token)?;
                format!("{}/{}", member, member.declaring_type().unwrap_or_default())
            }
            Operand::Switch(_) => format.multiple_labels(&self.targets()),
        })
    }

    /// The operand's encoded value as fixed-width uppercase hex.
    ///
    /// Floats show their IEEE 754 bit pattern, tokens their 32-bit value. A `switch` table is not
    /// dumped and renders as `...`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn raw_operand(&self) -> String {
        let format = &*self.format;

        match &self.operand {
            Operand::None => String::new(),
            Operand::ShortBranch(delta) => format.int8_to_hex(*delta as u8),
            Operand::Branch(delta) => format.int32_to_hex(*delta),
            Operand::ShortInt(value) | Operand::ShortVar(value) => format.int8_to_hex(*value),
            Operand::Int(value) => format.int32_to_hex(*value),
            Operand::LongInt(value) => format.int64_to_hex(*value),
            Operand::ShortFloat(value) => format.int32_to_hex(value.to_bits() as i32),
            Operand::Float(value) => format.int64_to_hex(value.to_bits() as i64),
            Operand::Var(index) => format.int16_to_hex(*index),
            Operand::StringToken(token)
            | Operand::SignatureToken(token)
            | Operand::MethodToken(token)
            | Operand::FieldToken(token)
            | Operand::TypeToken(token)
            | Operand::MemberToken(token) => format.int32_to_hex(token.value() as i32),
            Operand::Switch(_) => "...".to_string(),
        }
    }

    /// The provider this instruction renders with
    #[must_use]
    pub fn format_provider(&self) -> &Arc<dyn FormatProvider> {
        &self.format
    }

    /// Replaces the provider. Only rendering changes; the operand and any cached signature stay.
    pub fn set_format_provider(&mut self, format: Arc<dyn FormatProvider>) {
        self.format = format;
    }

    fn end(&self) -> i64 {
        // Offsets are bounded by the buffer length, which always fits an i64
        i64::try_from(self.offset + self.size()).unwrap_or(i64::MAX)
    }
}

/// `Declaring.Type::Name(Params)`, the method's display without its return type.
fn method_text(method: &MethodInfo) -> String {
    let display = method.to_string();
    let signature = display
        .split_once(' ')
        .map_or(display.as_str(), |(_, rest)| rest);

    format!(
        "{}::{}",
        method.declaring_type.as_deref().unwrap_or_default(),
        signature
    )
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format.format(self))
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("offset", &self.offset)
            .field("opcode", &self.opcode.name)
            .field("operand", &self.operand)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::{
            format::DefaultFormatProvider,
            opcodes::{one_byte, two_byte},
        },
        metadata::{FieldInfo, ScopeTokenResolver, TypeInfo},
        test::{CountingResolver, FailingResolver, SampleScope},
        Error,
    };

    fn instruction(
        offset: usize,
        opcode: &'static OpCode,
        operand: Operand,
        resolver: Arc<dyn TokenResolver>,
    ) -> Instruction {
        Instruction::new(
            offset,
            opcode,
            operand,
            resolver,
            Arc::new(DefaultFormatProvider),
        )
    }

    fn op(value: u8) -> &'static OpCode {
        one_byte(value).unwrap()
    }

    fn empty() -> Arc<dyn TokenResolver> {
        Arc::new(ScopeTokenResolver::new())
    }

    #[test]
    fn none_shape() {
        let nop = instruction(0, op(0x00), Operand::None, empty());

        assert_eq!(nop.offset(), 0);
        assert_eq!(nop.size(), 1);
        assert_eq!(nop.raw_operand(), "");
        assert_eq!(nop.processed_operand().unwrap(), "");
        assert_eq!(nop.target(), None);
        assert!(nop.targets().is_empty());
        assert_eq!(nop.to_string(), "IL_0000: nop        ");
    }

    #[test]
    fn branch_targets() {
        // br.s with delta 0 at offset 10
        let short = instruction(10, op(0x2B), Operand::ShortBranch(0), empty());
        assert_eq!(short.target(), Some(12));
        assert_eq!(short.processed_operand().unwrap(), "IL_000c");

        // br with delta 0 at offset 10
        let long = instruction(10, op(0x38), Operand::Branch(0), empty());
        assert_eq!(long.size(), 5);
        assert_eq!(long.target(), Some(15));
        assert_eq!(long.targets(), vec![15]);
    }

    #[test]
    fn backward_branch() {
        let short = instruction(4, op(0x2B), Operand::ShortBranch(-6), empty());

        assert_eq!(short.target(), Some(0));
        assert_eq!(short.raw_operand(), "FA");

        let long = instruction(0x20, op(0x38), Operand::Branch(-0x25), empty());
        assert_eq!(long.target(), Some(0));
        assert_eq!(long.raw_operand(), "FFFFFFDB");
    }

    #[test]
    fn switch_targets() {
        let switch = instruction(0, op(0x45), Operand::Switch(vec![0, 10]), empty());

        assert_eq!(switch.size(), 13);
        assert_eq!(switch.targets(), vec![13, 23]);
        assert_eq!(switch.target(), None);
        assert_eq!(switch.raw_operand(), "...");
        assert_eq!(
            switch.processed_operand().unwrap(),
            "(IL_000d, IL_0017)"
        );
    }

    #[test]
    fn numeric_operands() {
        let ldc_i4_s = instruction(0, op(0x1F), Operand::ShortInt(0x0A), empty());
        assert_eq!(ldc_i4_s.raw_operand(), "0A");
        assert_eq!(ldc_i4_s.processed_operand().unwrap(), "10");

        let ldc_i4 = instruction(0, op(0x20), Operand::Int(-5), empty());
        assert_eq!(ldc_i4.raw_operand(), "FFFFFFFB");
        assert_eq!(ldc_i4.processed_operand().unwrap(), "-5");

        let ldc_i8 = instruction(0, op(0x21), Operand::LongInt(1 << 40), empty());
        assert_eq!(ldc_i8.raw_operand(), "0000010000000000");
        assert_eq!(ldc_i8.processed_operand().unwrap(), "1099511627776");
        assert_eq!(ldc_i8.size(), 9);
    }

    #[test]
    fn float_operands() {
        let ldc_r4 = instruction(0, op(0x22), Operand::ShortFloat(1.5), empty());
        assert_eq!(ldc_r4.raw_operand(), "3FC00000");
        assert_eq!(ldc_r4.processed_operand().unwrap(), "1.5");

        let ldc_r8 = instruction(0, op(0x23), Operand::Float(-2.0), empty());
        assert_eq!(ldc_r8.raw_operand(), "C000000000000000");
        assert_eq!(ldc_r8.processed_operand().unwrap(), "-2");
    }

    #[test]
    fn variable_operands() {
        let ldloc_s = instruction(0, op(0x11), Operand::ShortVar(4), empty());
        assert_eq!(ldloc_s.raw_operand(), "04");
        assert_eq!(ldloc_s.processed_operand().unwrap(), "V_4");

        let ldloc = instruction(0, two_byte(0x0C).unwrap(), Operand::Var(300), empty());
        assert_eq!(ldloc.size(), 4);
        assert_eq!(ldloc.raw_operand(), "012C");
        assert_eq!(ldloc.processed_operand().unwrap(), "V_300");
    }

    #[test]
    fn token_operands() {
        let sample = SampleScope::new();
        let resolver: Arc<dyn TokenResolver> = sample.resolver.clone();

        let ldstr = instruction(0, op(0x72), Operand::StringToken(sample.string), resolver.clone());
        assert_eq!(ldstr.raw_operand(), "70000001");
        assert_eq!(ldstr.processed_operand().unwrap(), "\"Hello,\\tworld\"");
        assert_eq!(ldstr.token(), Some(sample.string));

        let call = instruction(0, op(0x28), Operand::MethodToken(sample.method), resolver.clone());
        assert_eq!(
            call.processed_operand().unwrap(),
            "System.Console::WriteLine(System.String)"
        );

        let ldfld = instruction(0, op(0x7B), Operand::FieldToken(sample.field), resolver.clone());
        assert_eq!(
            ldfld.processed_operand().unwrap(),
            "System.Int32 counter/Demo.Program"
        );

        let newarr = instruction(0, op(0x8D), Operand::TypeToken(sample.ty), resolver.clone());
        assert_eq!(newarr.processed_operand().unwrap(), "System.Object");

        let calli = instruction(0, op(0x29), Operand::SignatureToken(sample.signature), resolver);
        assert_eq!(calli.processed_operand().unwrap(), "SIG [00 01 01 08]");
    }

    #[test]
    fn member_operand() {
        let scope = ScopeTokenResolver::new();
        let ty = scope.add_type(TypeInfo::new("Outer+Inner").nested_in("Outer"));
        let field = scope.add_field(FieldInfo::new("Demo", "System.String", "name"));
        let method = scope.add_method(MethodInfo::new("Demo", "Void", "Run", Vec::<String>::new()));
        let resolver: Arc<dyn TokenResolver> = Arc::new(scope);

        let ldtoken = op(0xD0);
        let text = |token| {
            instruction(0, ldtoken, Operand::MemberToken(token), resolver.clone())
                .processed_operand()
                .unwrap()
        };

        assert_eq!(text(ty), "Outer+Inner/Outer");
        assert_eq!(text(field), "System.String name/Demo");
        assert_eq!(text(method), "Void Run()/Demo");
    }

    #[test]
    fn dynamic_method_has_empty_declaring_type() {
        let scope = ScopeTokenResolver::new();
        let token = scope.add_method(MethodInfo::dynamic("Int32", "Lambda", ["Int32", "Int32"]));

        let call = instruction(0, op(0x28), Operand::MethodToken(token), Arc::new(scope));
        assert_eq!(call.processed_operand().unwrap(), "::Lambda(Int32, Int32)");
    }

    #[test]
    fn unresolved_token_renders_inline_marker() {
        let call = instruction(
            2,
            op(0x28),
            Operand::MethodToken(Token(0x0600_0001)),
            Arc::new(FailingResolver),
        );

        assert!(matches!(
            call.processed_operand(),
            Err(Error::Resolution { expected: "method", .. })
        ));
        assert_eq!(call.raw_operand(), "06000001");
        assert_eq!(
            call.to_string(),
            "IL_0002: call       !\"Failed to resolve 0x06000001 as method\"!"
        );
    }

    #[test]
    fn signature_fetched_once() {
        let counting = Arc::new(CountingResolver::new());
        let token = counting.inner.add_signature(vec![0x00, 0x00, 0x01]);

        let calli = instruction(0, op(0x29), Operand::SignatureToken(token), counting.clone());

        assert_eq!(calli.signature().unwrap(), &[0x00, 0x00, 0x01]);
        assert_eq!(calli.signature().unwrap(), &[0x00, 0x00, 0x01]);
        assert_eq!(calli.processed_operand().unwrap(), "SIG [00 00 01]");
        assert_eq!(counting.signature_calls(), 1);
    }

    #[test]
    fn failed_signature_is_not_cached() {
        let counting = Arc::new(CountingResolver::new());
        let calli = instruction(
            0,
            op(0x29),
            Operand::SignatureToken(Token(0x1100_0001)),
            counting.clone(),
        );

        assert!(calli.signature().is_err());
        counting.inner.add_signature(vec![0x07]);
        assert_eq!(calli.signature().unwrap(), &[0x07]);
        assert_eq!(counting.signature_calls(), 2);
    }

    #[test]
    fn swap_format_provider() {
        struct Verbose;

        impl FormatProvider for Verbose {
            fn label(&self, offset: i64) -> String {
                format!("label_{offset}")
            }
        }

        let mut branch = instruction(0, op(0x2B), Operand::ShortBranch(1), empty());
        assert_eq!(branch.processed_operand().unwrap(), "IL_0003");

        branch.set_format_provider(Arc::new(Verbose));
        assert_eq!(branch.processed_operand().unwrap(), "label_3");
        assert_eq!(branch.to_string(), "IL_0000: br.s       label_3");
        assert_eq!(branch.raw_operand(), "01");
    }
}
