//! Metadata tokens and their resolution.
//!
//! CIL bytecode refers to fields, methods, types, strings and signatures through 32-bit
//! [`Token`] values. This module defines those tokens, the entities they resolve to, and the
//! [`TokenResolver`] contract through which the disassembler asks for them.
//!
//! # Key Components
//!
//! - [`token`] - The token value type and its table classification
//! - [`members`] - Resolved entities: [`TypeInfo`], [`FieldInfo`], [`MethodInfo`], [`Member`]
//! - [`resolver`] - The [`TokenResolver`] capability trait
//! - [`scope`] - [`ScopeTokenResolver`], resolution against a dynamic method's token scope
//!
//! # Examples
//!
//! ```rust
//! use ilscope::metadata::{MethodInfo, ScopeTokenResolver, TokenResolver};
//!
//! let scope = ScopeTokenResolver::new();
//! let token = scope.add_method(MethodInfo::new(
//!     "System.Console",
//!     "Void",
//!     "WriteLine",
//!     ["System.String"],
//! ));
//!
//! let method = scope.as_method(token)?;
//! assert_eq!(method.to_string(), "Void WriteLine(System.String)");
//! # Ok::<(), ilscope::Error>(())
//! ```

pub mod members;
pub mod resolver;
pub mod scope;
pub mod token;

pub use members::{FieldInfo, Member, MethodInfo, TypeInfo};
pub use resolver::TokenResolver;
pub use scope::{ScopeEntry, ScopeTokenResolver};
pub use token::{Token, TokenKind};
