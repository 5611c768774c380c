//! The token resolution contract.
//!
//! Bytecode never names a field, method, type or string directly; it embeds a 32-bit
//! [`crate::metadata::Token`] that only the owner of the method's metadata can interpret.
//! [`TokenResolver`] is the seam between the disassembler and that owner. The disassembler calls
//! it lazily, only when the processed text of an instruction is requested.

use widestring::U16String;

use crate::{
    metadata::{
        members::{FieldInfo, Member, MethodInfo, TypeInfo},
        token::{Token, TokenKind},
    },
    Result,
};

/// Maps tokens to the entities they name.
///
/// Every capability fails with [`crate::Error::Resolution`] when the token is unknown or names an
/// entity of another kind. Implementations must be idempotent: the same token always resolves to
/// the same entity, since several instructions (and several threads) may ask for it.
pub trait TokenResolver: Send + Sync {
    /// Resolves a field token (`ldfld`, `stsfld`, ...).
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the token does not name a field.
    fn as_field(&self, token: Token) -> Result<FieldInfo>;

    /// Resolves a method token (`call`, `newobj`, `ldftn`, ...).
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the token does not name a method.
    fn as_method(&self, token: Token) -> Result<MethodInfo>;

    /// Returns the raw signature bytes of a `calli` token.
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the token does not name a signature.
    fn as_signature(&self, token: Token) -> Result<Vec<u8>>;

    /// Resolves a string literal token (`ldstr`). Strings are UTF-16 and may contain unpaired
    /// surrogates.
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the token does not name a string.
    fn as_string(&self, token: Token) -> Result<U16String>;

    /// Resolves a type token (`box`, `newarr`, `castclass`, ...).
    ///
    /// # Errors
    /// Returns [`crate::Error::Resolution`] if the token does not name a type.
    fn as_type(&self, token: Token) -> Result<TypeInfo>;

    /// Resolves an `ldtoken` operand, which may name a type, a method or a field.
    ///
    /// Dispatch is by the token's table byte: `0x02` is a type, `0x06` a method and `0x04` a
    /// field.
    ///
    /// # Errors
    /// Returns the error of the capability the token was dispatched to.
    ///
    /// # Panics
    /// Panics for any other table byte. Such a token means the resolver and the code generator
    /// disagree about the token format, which is not something a renderer can recover from.
    fn as_member(&self, token: Token) -> Result<Member> {
        match token.kind() {
            Some(TokenKind::TypeDef) => self.as_type(token).map(Member::Type),
            Some(TokenKind::MethodDef) => self.as_method(token).map(Member::Method),
            Some(TokenKind::FieldDef) => self.as_field(token).map(Member::Field),
            _ => panic!("unexpected token type: {:08x}", token.value()),
        }
    }
}
