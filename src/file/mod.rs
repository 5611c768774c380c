//! Bounds-checked access to raw method body bytes.
//!
//! The disassembler never indexes into a method body directly. Every operand is read through
//! [`io::read_le_at`], which checks the remaining length first and reports a truncated body as
//! [`crate::Error::OutOfBounds`] instead of panicking.

pub(crate) mod io;
