// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # ilscope
//!
//! A disassembler for CIL (Common Intermediate Language) method bodies, built for methods that
//! only exist in memory: bytecode emitted by a runtime code generator, with its metadata tokens
//! resolved against the generator's token scope instead of metadata tables.
//!
//! ## Features
//!
//! - **Complete instruction set** - Every ECMA-335 Partition III opcode, one and two byte forms
//! - **Lazy token resolution** - Tokens are resolved only when an instruction is rendered
//! - **Fault tolerant rendering** - A token that does not resolve becomes an inline marker
//! - **Replaceable formatting** - Override single rendering rules or swap the whole provider
//! - **Parallel batches** - Render many method bodies at once on the `rayon` pool
//!
//! ## Quick Start
//!
//! ```rust
//! use ilscope::prelude::*;
//! use std::sync::Arc;
//!
//! let scope = ScopeTokenResolver::new();
//! let message = scope.add_string("Hello, World!");
//! let write_line = scope.add_method(MethodInfo::new(
//!     "System.Console",
//!     "Void",
//!     "WriteLine",
//!     ["System.String"],
//! ));
//!
//! let mut body = vec![0x72];
//! body.extend_from_slice(&message.value().to_le_bytes());
//! body.push(0x28);
//! body.extend_from_slice(&write_line.value().to_le_bytes());
//! body.push(0x2A);
//!
//! let mut decoder = Decoder::new(body, Arc::new(scope));
//! print!("{}", decoder.text()?);
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! prints
//!
//! ```text
//! IL_0000: ldstr      "Hello, World!"
//! IL_0005: call       System.Console::WriteLine(System.String)
//! IL_000a: ret
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Tokens, resolved members and the [`metadata::TokenResolver`] contract
//! - [`disassembler`] - Opcode tables, instruction decoding and text rendering
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade and never installs a logger itself. Decoder
//! restarts and aborted decodes are logged at `debug`, every decoded instruction at `trace`, and
//! a method body extraction that had to fall back at `warn`.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// CIL instruction decoding and rendering.
pub mod disassembler;

/// Metadata tokens and their resolution.
pub mod metadata;

/// `ilscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `ilscope` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
