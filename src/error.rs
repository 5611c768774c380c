use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which covers every failure this library can report.
///
/// Only two kinds of error abort a disassembly: [`Error::Malformed`] and
/// [`Error::OutOfBounds`], both raised while decoding a structurally corrupt buffer.
/// [`Error::Resolution`] is produced lazily while rendering a single instruction and is
/// turned into an inline marker by [`crate::disassembler::FormatProvider::format`].
/// [`Error::Extraction`] never reaches the caller of [`crate::disassembler::MethodBody::extract`];
/// it is absorbed by the fallback path and reported as a boolean.
///
/// # Examples
///
/// ```rust
/// use ilscope::{disassembler::Decoder, metadata::ScopeTokenResolver, Error};
/// use std::sync::Arc;
///
/// let mut decoder = Decoder::new(vec![0xFE, 0xFF], Arc::new(ScopeTokenResolver::new()));
/// match decoder.decode_all() {
///     Err(Error::Malformed { message, .. }) => println!("corrupt body: {message}"),
///     Err(e) => println!("other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The bytecode is damaged or uses an encoding this library does not support.
    ///
    /// Raised for opcode bytes that match neither opcode table and for switch tables
    /// whose declared case count cannot fit in the remaining buffer. The error records
    /// the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An operand extends past the end of the buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The token resolver could not map a token to an entity of the requested kind.
    ///
    /// Either the token does not name an entry in the resolution scope, or the entry it
    /// names is of a different kind (e.g. a string token passed to `as_field`).
    #[error("Failed to resolve {token} as {expected}")]
    Resolution {
        /// The token that failed to resolve
        token: Token,
        /// The kind of entity the caller asked for
        expected: &'static str,
    },

    /// The host's privileged method body extraction failed.
    #[error("Method body extraction failed - {0}")]
    Extraction(String),
}
