//! Metadata tokens embedded in CIL operands.

use std::fmt;

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// A metadata token as it appears inline in CIL bytecode.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table the token refers to
/// - The low 24 bits (bits 0-23) indicate the row, which for a dynamic method scope is the
///   index into the scope's entry list
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table byte and a row index. Rows above 24 bits are truncated.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Classifies the token by its table byte, `None` for tables no resolver capability maps to.
    #[must_use]
    pub fn kind(&self) -> Option<TokenKind> {
        match self.table() {
            0x02 => Some(TokenKind::TypeDef),
            0x04 => Some(TokenKind::FieldDef),
            0x06 => Some(TokenKind::MethodDef),
            0x0A => Some(TokenKind::MemberRef),
            0x11 => Some(TokenKind::StandAloneSig),
            0x70 => Some(TokenKind::String),
            _ => None,
        }
    }
}

/// The token tables a dynamic method scope hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount, IntoStaticStr)]
pub enum TokenKind {
    /// `0x02` - a type handle
    TypeDef,
    /// `0x04` - a field handle
    FieldDef,
    /// `0x06` - a method handle, another dynamic method, or a method paired with its generic
    /// context
    MethodDef,
    /// `0x0A` - a vararg call site
    MemberRef,
    /// `0x11` - a raw signature blob (`calli`)
    StandAloneSig,
    /// `0x70` - a string literal (`ldstr`)
    String,
}

impl TokenKind {
    /// The table byte tokens of this kind carry
    #[must_use]
    pub fn table(self) -> u8 {
        match self {
            TokenKind::TypeDef => 0x02,
            TokenKind::FieldDef => 0x04,
            TokenKind::MethodDef => 0x06,
            TokenKind::MemberRef => 0x0A,
            TokenKind::StandAloneSig => 0x11,
            TokenKind::String => 0x70,
        }
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);

        let token = Token(0x70FF_FFFF);
        assert_eq!(token.table(), 0x70);
        assert_eq!(token.row(), 0x00FF_FFFF);
    }

    #[test]
    fn test_token_from_parts() {
        assert_eq!(Token::from_parts(0x04, 7), Token(0x0400_0007));
        // Rows are limited to 24 bits
        assert_eq!(Token::from_parts(0x02, 0x0100_0003), Token(0x0200_0003));
    }

    #[test]
    fn test_token_kind() {
        assert_eq!(Token(0x0200_0001).kind(), Some(TokenKind::TypeDef));
        assert_eq!(Token(0x0400_0001).kind(), Some(TokenKind::FieldDef));
        assert_eq!(Token(0x0600_0001).kind(), Some(TokenKind::MethodDef));
        assert_eq!(Token(0x7000_0001).kind(), Some(TokenKind::String));
        assert_eq!(Token(0x0100_0001).kind(), None);
        assert_eq!(Token(0x2B00_0001).kind(), None);
    }

    #[test]
    fn test_token_kind_table_roundtrip() {
        assert_eq!(TokenKind::COUNT, 6);
        for kind in TokenKind::iter() {
            assert_eq!(Token::from_parts(kind.table(), 1).kind(), Some(kind));
        }
    }

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", Token(0x0600_0001)), "0x06000001");
        assert_eq!(
            format!("{:?}", Token(0x0600_0001)),
            "Token(0x06000001, table: 0x06, row: 1)"
        );
    }

    #[test]
    fn test_token_conversion() {
        let token: Token = 0x1100_0002u32.into();
        assert_eq!(u32::from(token), 0x1100_0002);
    }
}
