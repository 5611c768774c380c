//! Text rendering conventions for decoded instructions.
//!
//! Decoding and rendering are deliberately separate: an [`crate::disassembler::Instruction`] only
//! knows its operand, and asks its [`FormatProvider`] how labels, hex numbers, strings and
//! signatures are spelled. Every operation has a default implementation, so a custom provider
//! overrides only what it wants to change and [`DefaultFormatProvider`] is simply the provider
//! that overrides nothing.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::disassembler::{DefaultFormatProvider, FormatProvider};
//!
//! struct LowerCaseHex;
//!
//! impl FormatProvider for LowerCaseHex {
//!     fn int32_to_hex(&self, value: i32) -> String {
//!         format!("{value:08x}")
//!     }
//! }
//!
//! assert_eq!(DefaultFormatProvider.int32_to_hex(0xAB), "000000AB");
//! assert_eq!(LowerCaseHex.int32_to_hex(0xAB), "000000ab");
//! assert_eq!(LowerCaseHex.label(0x12), "IL_0012");
//! ```

use widestring::{U16Str, U16String};

use crate::disassembler::instruction::Instruction;

/// Rendering strategy for instructions and their operands.
///
/// Implementations must be stateless or internally synchronized; a provider is shared by every
/// instruction a decoder produces.
pub trait FormatProvider: Send + Sync {
    /// Fixed-width uppercase hex of a 64-bit value.
    fn int64_to_hex(&self, value: i64) -> String {
        format!("{value:016X}")
    }

    /// Fixed-width uppercase hex of a 32-bit value.
    fn int32_to_hex(&self, value: i32) -> String {
        format!("{value:08X}")
    }

    /// Fixed-width uppercase hex of a 16-bit value.
    fn int16_to_hex(&self, value: u16) -> String {
        format!("{value:04X}")
    }

    /// Fixed-width uppercase hex of an 8-bit value.
    fn int8_to_hex(&self, value: u8) -> String {
        format!("{value:02X}")
    }

    /// Name of a local variable or argument ordinal.
    fn argument(&self, ordinal: u16) -> String {
        format!("V_{ordinal}")
    }

    /// Label of an instruction offset. Offsets before the start of the body, which only a
    /// corrupt branch can produce, keep their sign: `IL_-000e`.
    fn label(&self, offset: i64) -> String {
        if offset < 0 {
            format!("IL_-{:04x}", offset.unsigned_abs())
        } else {
            format!("IL_{offset:04x}")
        }
    }

    /// Parenthesized, comma-separated labels, e.g. `(IL_000d, IL_0017)`.
    fn multiple_labels(&self, offsets: &[i64]) -> String {
        let labels: Vec<String> = offsets.iter().map(|&offset| self.label(offset)).collect();
        format!("({})", labels.join(", "))
    }

    /// Quoted string literal with control and non-ASCII code units escaped.
    ///
    /// `\t`, `\n`, `\r`, `"` and `\` get their usual escapes; any other UTF-16 code unit below
    /// `0x20` or from `0x7F` upward becomes `\uxxxx`.
    fn escaped_string(&self, value: &U16Str) -> String {
        let units = value.as_slice();
        let mut escaped = String::with_capacity(units.len() * 2 + 2);

        escaped.push('"');
        for &unit in units {
            match unit {
                0x09 => escaped.push_str("\\t"),
                0x0A => escaped.push_str("\\n"),
                0x0D => escaped.push_str("\\r"),
                0x22 => escaped.push_str("\\\""),
                0x5C => escaped.push_str("\\\\"),
                0x20..=0x7E => escaped.push(char::from(unit as u8)),
                _ => escaped.push_str(&format!("\\u{unit:04x}")),
            }
        }
        escaped.push('"');

        escaped
    }

    /// Hex dump of a signature blob, e.g. `SIG [00 01 08]`.
    fn signature_to_string(&self, signature: &[u8]) -> String {
        let bytes: Vec<String> = signature.iter().map(|&b| self.int8_to_hex(b)).collect();
        format!("SIG [{}]", bytes.join(" "))
    }

    /// Full line for an instruction: `IL_{offset}: {mnemonic} {processed operand}`.
    ///
    /// A processed operand that cannot be computed, usually because its token does not resolve,
    /// is replaced by the escaped error message between `!` marks. Rendering never fails.
    fn format(&self, instruction: &Instruction) -> String {
        let processed = match instruction.processed_operand() {
            Ok(processed) => processed,
            Err(error) => {
                log::debug!(
                    "Operand of {} at offset {} did not resolve: {}",
                    instruction.opcode().name,
                    instruction.offset(),
                    error
                );
                format!(
                    "!{}!",
                    self.escaped_string(&U16String::from_str(&error.to_string()))
                )
            }
        };

        format!(
            "IL_{:04x}: {:<10} {}",
            instruction.offset(),
            instruction.opcode().name,
            processed
        )
    }
}

/// The default rendering conventions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultFormatProvider;

impl FormatProvider for DefaultFormatProvider {}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(value: &str) -> String {
        DefaultFormatProvider.escaped_string(&U16String::from_str(value))
    }

    #[test]
    fn hex_is_fixed_width() {
        let provider = DefaultFormatProvider;

        assert_eq!(provider.int8_to_hex(0x0A), "0A");
        assert_eq!(provider.int16_to_hex(0x1F), "001F");
        assert_eq!(provider.int32_to_hex(5), "00000005");
        assert_eq!(provider.int64_to_hex(0x1234), "0000000000001234");
    }

    #[test]
    fn hex_of_negative_values() {
        let provider = DefaultFormatProvider;

        assert_eq!(provider.int32_to_hex(-1), "FFFFFFFF");
        assert_eq!(provider.int64_to_hex(-2), "FFFFFFFFFFFFFFFE");
    }

    #[test]
    fn labels() {
        let provider = DefaultFormatProvider;

        assert_eq!(provider.label(0x12), "IL_0012");
        assert_eq!(provider.label(0x12345), "IL_12345");
        assert_eq!(provider.label(-14), "IL_-000e");
        assert_eq!(provider.multiple_labels(&[-1, 2]), "(IL_-0001, IL_0002)");
        assert_eq!(provider.argument(3), "V_3");
        assert_eq!(provider.multiple_labels(&[13, 23]), "(IL_000d, IL_0017)");
        assert_eq!(provider.multiple_labels(&[]), "()");
    }

    #[test]
    fn escape_named_characters() {
        assert_eq!(escape("a\tb"), "\"a\\tb\"");
        assert_eq!(escape("\r\n"), "\"\\r\\n\"");
        assert_eq!(escape("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape("C:\\temp"), "\"C:\\\\temp\"");
    }

    #[test]
    fn escape_control_and_non_ascii() {
        assert_eq!(escape("\u{7f}"), "\"\\u007f\"");
        assert_eq!(escape("\u{1}"), "\"\\u0001\"");
        assert_eq!(escape("é"), "\"\\u00e9\"");
        // Characters outside the BMP are escaped per UTF-16 code unit
        assert_eq!(escape("😀"), "\"\\ud83d\\ude00\"");
    }

    #[test]
    fn escape_printable_ascii_passthrough() {
        let printable: String = (0x20u8..0x7F)
            .map(char::from)
            .filter(|c| *c != '"' && *c != '\\')
            .collect();
        assert_eq!(escape(&printable), format!("\"{printable}\""));
    }

    #[test]
    fn escape_lone_surrogate() {
        let value = U16String::from_vec(vec![0x0041, 0xD800]);
        assert_eq!(
            DefaultFormatProvider.escaped_string(&value),
            "\"A\\ud800\""
        );
    }

    #[test]
    fn signature_dump() {
        let provider = DefaultFormatProvider;

        assert_eq!(
            provider.signature_to_string(&[0x00, 0x02, 0x0E, 0x1C]),
            "SIG [00 02 0E 1C]"
        );
        assert_eq!(provider.signature_to_string(&[]), "SIG []");
    }
}
