//! Token resolution against a dynamic method's token scope.
//!
//! A code generator that emits a method at runtime does not write metadata tables. Instead it
//! keeps an append-only list of the objects the method refers to and hands out tokens whose row is
//! the position in that list. [`ScopeTokenResolver`] is that list: the host (or a test) appends
//! [`ScopeEntry`] values while emitting, and the disassembler resolves the tokens found in the
//! bytecode against it afterwards.
//!
//! # Thread Safety
//!
//! Entries are stored in a [`boxcar::Vec`], so appending and resolving can happen concurrently
//! without locks. Entries are never removed or replaced, which keeps resolution idempotent.

use widestring::U16String;

use crate::{
    metadata::{
        members::{FieldInfo, MethodInfo, TypeInfo},
        resolver::TokenResolver,
        token::{Token, TokenKind},
    },
    Error, Result,
};

/// One object referenced by a dynamic method.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEntry {
    /// A string literal
    String(U16String),
    /// A standalone signature blob
    Signature(Vec<u8>),
    /// A runtime type handle
    Type(TypeInfo),
    /// A runtime field handle
    Field(FieldInfo),
    /// A runtime method handle
    Method(MethodInfo),
    /// Another dynamic method
    DynamicMethod(MethodInfo),
    /// A method handle paired with the generic type instantiation it is called on
    GenericMethod {
        /// The method as declared on the open generic type
        method: MethodInfo,
        /// The instantiated declaring type
        context: TypeInfo,
    },
    /// A vararg call site: the target method and the call-site signature
    VarArgMethod {
        /// The called method
        method: MethodInfo,
        /// The call-site signature including the variable arguments
        signature: Vec<u8>,
    },
}

impl ScopeEntry {
    /// The token table this entry is handed out under
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            ScopeEntry::String(_) => TokenKind::String,
            ScopeEntry::Signature(_) => TokenKind::StandAloneSig,
            ScopeEntry::Type(_) => TokenKind::TypeDef,
            ScopeEntry::Field(_) => TokenKind::FieldDef,
            ScopeEntry::Method(_)
            | ScopeEntry::DynamicMethod(_)
            | ScopeEntry::GenericMethod { .. } => TokenKind::MethodDef,
            ScopeEntry::VarArgMethod { .. } => TokenKind::MemberRef,
        }
    }
}

/// A [`TokenResolver`] backed by a dynamic method's token scope.
///
/// Row 0 is never handed out; the first entry receives row 1.
///
/// # Examples
///
/// ```rust
/// use ilscope::metadata::{ScopeTokenResolver, TokenResolver, TypeInfo};
///
/// let scope = ScopeTokenResolver::new();
/// let token = scope.add_type(TypeInfo::new("System.String"));
///
/// assert_eq!(token.value(), 0x0200_0001);
/// assert_eq!(scope.as_type(token)?.full_name, "System.String");
/// # Ok::<(), ilscope::Error>(())
/// ```
pub struct ScopeTokenResolver {
    entries: boxcar::Vec<ScopeEntry>,
}

impl Default for ScopeTokenResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTokenResolver {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        ScopeTokenResolver {
            entries: boxcar::Vec::new(),
        }
    }

    /// Appends an entry and returns the token that refers to it.
    pub fn push(&self, entry: ScopeEntry) -> Token {
        let table = entry.kind().table();
        let index = self.entries.push(entry);
        Token::from_parts(table, u32::try_from(index + 1).unwrap_or(u32::MAX))
    }

    /// Appends a string literal.
    pub fn add_string(&self, value: &str) -> Token {
        self.push(ScopeEntry::String(U16String::from_str(value)))
    }

    /// Appends a standalone signature blob.
    pub fn add_signature(&self, signature: Vec<u8>) -> Token {
        self.push(ScopeEntry::Signature(signature))
    }

    /// Appends a type handle.
    pub fn add_type(&self, ty: TypeInfo) -> Token {
        self.push(ScopeEntry::Type(ty))
    }

    /// Appends a field handle.
    pub fn add_field(&self, field: FieldInfo) -> Token {
        self.push(ScopeEntry::Field(field))
    }

    /// Appends a method handle.
    pub fn add_method(&self, method: MethodInfo) -> Token {
        self.push(ScopeEntry::Method(method))
    }

    /// Returns the number of entries in the scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if nothing was added to the scope yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Returns the entry a token refers to, ignoring the token's table byte.
    #[must_use]
    pub fn entry(&self, token: Token) -> Option<&ScopeEntry> {
        let row = token.row() as usize;
        if row == 0 {
            return None;
        }

        self.entries.get(row - 1)
    }

    fn lookup(&self, token: Token, expected: &'static str) -> Result<&ScopeEntry> {
        self.entry(token)
            .ok_or(Error::Resolution { token, expected })
    }
}

impl TokenResolver for ScopeTokenResolver {
    fn as_field(&self, token: Token) -> Result<FieldInfo> {
        match self.lookup(token, "field")? {
            ScopeEntry::Field(field) => Ok(field.clone()),
            _ => Err(Error::Resolution {
                token,
                expected: "field",
            }),
        }
    }

    fn as_method(&self, token: Token) -> Result<MethodInfo> {
        match self.lookup(token, "method")? {
            ScopeEntry::DynamicMethod(method) | ScopeEntry::Method(method) => Ok(method.clone()),
            ScopeEntry::GenericMethod { method, context } => Ok(method.in_context(context)),
            ScopeEntry::VarArgMethod { method, .. } => Ok(method.clone()),
            _ => Err(Error::Resolution {
                token,
                expected: "method",
            }),
        }
    }

    fn as_signature(&self, token: Token) -> Result<Vec<u8>> {
        match self.lookup(token, "signature")? {
            ScopeEntry::Signature(signature) => Ok(signature.clone()),
            _ => Err(Error::Resolution {
                token,
                expected: "signature",
            }),
        }
    }

    fn as_string(&self, token: Token) -> Result<U16String> {
        match self.lookup(token, "string")? {
            ScopeEntry::String(value) => Ok(value.clone()),
            _ => Err(Error::Resolution {
                token,
                expected: "string",
            }),
        }
    }

    fn as_type(&self, token: Token) -> Result<TypeInfo> {
        match self.lookup(token, "type")? {
            ScopeEntry::Type(ty) => Ok(ty.clone()),
            _ => Err(Error::Resolution {
                token,
                expected: "type",
            }),
        }
    }
}
