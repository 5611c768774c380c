//! CIL opcode classification tables (ECMA-335 Partition III).
//!
//! Every opcode is either a single byte or the escape byte [`TWO_BYTE_ESCAPE`] (`0xFE`) followed
//! by a second byte. This module classifies each defined value into an [`OpCode`]: its canonical
//! mnemonic and the [`OperandShape`] that determines how many operand bytes follow and how they
//! are interpreted.
//!
//! The two lookup tables are built on first use from [`OPCODE_DEFINITIONS`] and shared, read-only,
//! by every decoder in the process. The escape byte and the reserved prefix bytes `0xF8`-`0xFF`
//! have no entry in the one-byte table, so no byte value is ambiguous between the two tables.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::disassembler::{one_byte, two_byte, OperandShape};
//!
//! let ret = one_byte(0x2A).unwrap();
//! assert_eq!(ret.name, "ret");
//! assert_eq!(ret.shape, OperandShape::None);
//!
//! let ceq = two_byte(0x01).unwrap();
//! assert_eq!(ceq.value, 0xFE01);
//! assert_eq!(ceq.size(), 2);
//! ```

use std::sync::OnceLock;

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// The first byte of every two-byte opcode
pub const TWO_BYTE_ESCAPE: u8 = 0xFE;

/// How the bytes following an opcode are laid out and interpreted.
///
/// Each variant corresponds to one operand type of the instruction set. The names describe the
/// payload rather than the host's `OperandType` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum OperandShape {
    /// No operand
    None,
    /// Signed 8-bit branch delta (`br.s`, `leave.s`, ...)
    ShortBranch,
    /// Signed 32-bit branch delta (`br`, `leave`, ...)
    Branch,
    /// Unsigned 8-bit integer (`ldc.i4.s`, `unaligned.`)
    ShortInt,
    /// Signed 32-bit integer (`ldc.i4`)
    Int,
    /// Signed 64-bit integer (`ldc.i8`)
    LongInt,
    /// 32-bit IEEE float (`ldc.r4`)
    ShortFloat,
    /// 64-bit IEEE float (`ldc.r8`)
    Float,
    /// Unsigned 8-bit local or argument ordinal (`ldloc.s`, `starg.s`, ...)
    ShortVar,
    /// Unsigned 16-bit local or argument ordinal (`ldloc`, `starg`, ...)
    Var,
    /// String literal token (`ldstr`)
    StringToken,
    /// Standalone signature token (`calli`)
    SignatureToken,
    /// Method token (`call`, `newobj`, `ldftn`, ...)
    MethodToken,
    /// Field token (`ldfld`, `stsfld`, ...)
    FieldToken,
    /// Type token (`box`, `newarr`, `castclass`, ...)
    TypeToken,
    /// Type, method or field token (`ldtoken`)
    MemberToken,
    /// Case count followed by that many signed 32-bit deltas (`switch`)
    Switch,
}

impl OperandShape {
    /// Returns the size in bytes of this operand, or `None` for [`OperandShape::Switch`] whose
    /// size depends on the case count stored in the bytecode.
    #[must_use]
    pub const fn operand_size(&self) -> Option<usize> {
        match self {
            OperandShape::None => Some(0),
            OperandShape::ShortBranch | OperandShape::ShortInt | OperandShape::ShortVar => Some(1),
            OperandShape::Var => Some(2),
            OperandShape::Branch
            | OperandShape::Int
            | OperandShape::ShortFloat
            | OperandShape::StringToken
            | OperandShape::SignatureToken
            | OperandShape::MethodToken
            | OperandShape::FieldToken
            | OperandShape::TypeToken
            | OperandShape::MemberToken => Some(4),
            OperandShape::LongInt | OperandShape::Float => Some(8),
            OperandShape::Switch => None,
        }
    }

    /// Returns `true` for shapes whose operand is a metadata token.
    #[must_use]
    pub const fn is_token(&self) -> bool {
        matches!(
            self,
            OperandShape::StringToken
                | OperandShape::SignatureToken
                | OperandShape::MethodToken
                | OperandShape::FieldToken
                | OperandShape::TypeToken
                | OperandShape::MemberToken
        )
    }
}

/// A classified opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpCode {
    /// Encoded value; two-byte opcodes carry [`TWO_BYTE_ESCAPE`] in the high byte
    pub value: u16,
    /// Canonical mnemonic, e.g. `ldloc.s`
    pub name: &'static str,
    /// Layout of the operand following the opcode
    pub shape: OperandShape,
}

impl OpCode {
    /// Returns `true` if this opcode is encoded with the escape byte.
    #[must_use]
    pub const fn is_two_byte(&self) -> bool {
        self.value > 0xFF
    }

    /// Number of bytes the opcode itself occupies (1 or 2).
    #[must_use]
    pub const fn size(&self) -> usize {
        if self.is_two_byte() {
            2
        } else {
            1
        }
    }
}

macro_rules! opcodes {
    ($($value:literal => $name:literal, $shape:ident;)*) => {
        &[$(OpCode { value: $value, name: $name, shape: OperandShape::$shape },)*]
    };
}

/// Every opcode the disassembler recognizes, in encoding order.
pub static OPCODE_DEFINITIONS: &[OpCode] = opcodes! {
    0x00 => "nop", None;
    0x01 => "break", None;
    0x02 => "ldarg.0", None;
    0x03 => "ldarg.1", None;
    0x04 => "ldarg.2", None;
    0x05 => "ldarg.3", None;
    0x06 => "ldloc.0", None;
    0x07 => "ldloc.1", None;
    0x08 => "ldloc.2", None;
    0x09 => "ldloc.3", None;
    0x0A => "stloc.0", None;
    0x0B => "stloc.1", None;
    0x0C => "stloc.2", None;
    0x0D => "stloc.3", None;
    0x0E => "ldarg.s", ShortVar;
    0x0F => "ldarga.s", ShortVar;
    0x10 => "starg.s", ShortVar;
    0x11 => "ldloc.s", ShortVar;
    0x12 => "ldloca.s", ShortVar;
    0x13 => "stloc.s", ShortVar;
    0x14 => "ldnull", None;
    0x15 => "ldc.i4.m1", None;
    0x16 => "ldc.i4.0", None;
    0x17 => "ldc.i4.1", None;
    0x18 => "ldc.i4.2", None;
    0x19 => "ldc.i4.3", None;
    0x1A => "ldc.i4.4", None;
    0x1B => "ldc.i4.5", None;
    0x1C => "ldc.i4.6", None;
    0x1D => "ldc.i4.7", None;
    0x1E => "ldc.i4.8", None;
    0x1F => "ldc.i4.s", ShortInt;
    0x20 => "ldc.i4", Int;
    0x21 => "ldc.i8", LongInt;
    0x22 => "ldc.r4", ShortFloat;
    0x23 => "ldc.r8", Float;
    0x25 => "dup", None;
    0x26 => "pop", None;
    0x27 => "jmp", MethodToken;
    0x28 => "call", MethodToken;
    0x29 => "calli", SignatureToken;
    0x2A => "ret", None;
    0x2B => "br.s", ShortBranch;
    0x2C => "brfalse.s", ShortBranch;
    0x2D => "brtrue.s", ShortBranch;
    0x2E => "beq.s", ShortBranch;
    0x2F => "bge.s", ShortBranch;
    0x30 => "bgt.s", ShortBranch;
    0x31 => "ble.s", ShortBranch;
    0x32 => "blt.s", ShortBranch;
    0x33 => "bne.un.s", ShortBranch;
    0x34 => "bge.un.s", ShortBranch;
    0x35 => "bgt.un.s", ShortBranch;
    0x36 => "ble.un.s", ShortBranch;
    0x37 => "blt.un.s", ShortBranch;
    0x38 => "br", Branch;
    0x39 => "brfalse", Branch;
    0x3A => "brtrue", Branch;
    0x3B => "beq", Branch;
    0x3C => "bge", Branch;
    0x3D => "bgt", Branch;
    0x3E => "ble", Branch;
    0x3F => "blt", Branch;
    0x40 => "bne.un", Branch;
    0x41 => "bge.un", Branch;
    0x42 => "bgt.un", Branch;
    0x43 => "ble.un", Branch;
    0x44 => "blt.un", Branch;
    0x45 => "switch", Switch;
    0x46 => "ldind.i1", None;
    0x47 => "ldind.u1", None;
    0x48 => "ldind.i2", None;
    0x49 => "ldind.u2", None;
    0x4A => "ldind.i4", None;
    0x4B => "ldind.u4", None;
    0x4C => "ldind.i8", None;
    0x4D => "ldind.i", None;
    0x4E => "ldind.r4", None;
    0x4F => "ldind.r8", None;
    0x50 => "ldind.ref", None;
    0x51 => "stind.ref", None;
    0x52 => "stind.i1", None;
    0x53 => "stind.i2", None;
    0x54 => "stind.i4", None;
    0x55 => "stind.i8", None;
    0x56 => "stind.r4", None;
    0x57 => "stind.r8", None;
    0x58 => "add", None;
    0x59 => "sub", None;
    0x5A => "mul", None;
    0x5B => "div", None;
    0x5C => "div.un", None;
    0x5D => "rem", None;
    0x5E => "rem.un", None;
    0x5F => "and", None;
    0x60 => "or", None;
    0x61 => "xor", None;
    0x62 => "shl", None;
    0x63 => "shr", None;
    0x64 => "shr.un", None;
    0x65 => "neg", None;
    0x66 => "not", None;
    0x67 => "conv.i1", None;
    0x68 => "conv.i2", None;
    0x69 => "conv.i4", None;
    0x6A => "conv.i8", None;
    0x6B => "conv.r4", None;
    0x6C => "conv.r8", None;
    0x6D => "conv.u4", None;
    0x6E => "conv.u8", None;
    0x6F => "callvirt", MethodToken;
    0x70 => "cpobj", TypeToken;
    0x71 => "ldobj", TypeToken;
    0x72 => "ldstr", StringToken;
    0x73 => "newobj", MethodToken;
    0x74 => "castclass", TypeToken;
    0x75 => "isinst", TypeToken;
    0x76 => "conv.r.un", None;
    0x79 => "unbox", TypeToken;
    0x7A => "throw", None;
    0x7B => "ldfld", FieldToken;
    0x7C => "ldflda", FieldToken;
    0x7D => "stfld", FieldToken;
    0x7E => "ldsfld", FieldToken;
    0x7F => "ldsflda", FieldToken;
    0x80 => "stsfld", FieldToken;
    0x81 => "stobj", TypeToken;
    0x82 => "conv.ovf.i1.un", None;
    0x83 => "conv.ovf.i2.un", None;
    0x84 => "conv.ovf.i4.un", None;
    0x85 => "conv.ovf.i8.un", None;
    0x86 => "conv.ovf.u1.un", None;
    0x87 => "conv.ovf.u2.un", None;
    0x88 => "conv.ovf.u4.un", None;
    0x89 => "conv.ovf.u8.un", None;
    0x8A => "conv.ovf.i.un", None;
    0x8B => "conv.ovf.u.un", None;
    0x8C => "box", TypeToken;
    0x8D => "newarr", TypeToken;
    0x8E => "ldlen", None;
    0x8F => "ldelema", TypeToken;
    0x90 => "ldelem.i1", None;
    0x91 => "ldelem.u1", None;
    0x92 => "ldelem.i2", None;
    0x93 => "ldelem.u2", None;
    0x94 => "ldelem.i4", None;
    0x95 => "ldelem.u4", None;
    0x96 => "ldelem.i8", None;
    0x97 => "ldelem.i", None;
    0x98 => "ldelem.r4", None;
    0x99 => "ldelem.r8", None;
    0x9A => "ldelem.ref", None;
    0x9B => "stelem.i", None;
    0x9C => "stelem.i1", None;
    0x9D => "stelem.i2", None;
    0x9E => "stelem.i4", None;
    0x9F => "stelem.i8", None;
    0xA0 => "stelem.r4", None;
    0xA1 => "stelem.r8", None;
    0xA2 => "stelem.ref", None;
    0xA3 => "ldelem", TypeToken;
    0xA4 => "stelem", TypeToken;
    0xA5 => "unbox.any", TypeToken;
    0xB3 => "conv.ovf.i1", None;
    0xB4 => "conv.ovf.u1", None;
    0xB5 => "conv.ovf.i2", None;
    0xB6 => "conv.ovf.u2", None;
    0xB7 => "conv.ovf.i4", None;
    0xB8 => "conv.ovf.u4", None;
    0xB9 => "conv.ovf.i8", None;
    0xBA => "conv.ovf.u8", None;
    0xC2 => "refanyval", TypeToken;
    0xC3 => "ckfinite", None;
    0xC6 => "mkrefany", TypeToken;
    0xD0 => "ldtoken", MemberToken;
    0xD1 => "conv.u2", None;
    0xD2 => "conv.u1", None;
    0xD3 => "conv.i", None;
    0xD4 => "conv.ovf.i", None;
    0xD5 => "conv.ovf.u", None;
    0xD6 => "add.ovf", None;
    0xD7 => "add.ovf.un", None;
    0xD8 => "mul.ovf", None;
    0xD9 => "mul.ovf.un", None;
    0xDA => "sub.ovf", None;
    0xDB => "sub.ovf.un", None;
    0xDC => "endfinally", None;
    0xDD => "leave", Branch;
    0xDE => "leave.s", ShortBranch;
    0xDF => "stind.i", None;
    0xE0 => "conv.u", None;
    0xFE00 => "arglist", None;
    0xFE01 => "ceq", None;
    0xFE02 => "cgt", None;
    0xFE03 => "cgt.un", None;
    0xFE04 => "clt", None;
    0xFE05 => "clt.un", None;
    0xFE06 => "ldftn", MethodToken;
    0xFE07 => "ldvirtftn", MethodToken;
    0xFE09 => "ldarg", Var;
    0xFE0A => "ldarga", Var;
    0xFE0B => "starg", Var;
    0xFE0C => "ldloc", Var;
    0xFE0D => "ldloca", Var;
    0xFE0E => "stloc", Var;
    0xFE0F => "localloc", None;
    0xFE11 => "endfilter", None;
    0xFE12 => "unaligned.", ShortInt;
    0xFE13 => "volatile.", None;
    0xFE14 => "tail.", None;
    0xFE15 => "initobj", TypeToken;
    0xFE16 => "constrained.", TypeToken;
    0xFE17 => "cpblk", None;
    0xFE18 => "initblk", None;
    0xFE1A => "rethrow", None;
    0xFE1C => "sizeof", TypeToken;
    0xFE1D => "refanytype", None;
    0xFE1E => "readonly.", None;
};

struct OpCodeTables {
    one_byte: [Option<&'static OpCode>; 256],
    two_byte: [Option<&'static OpCode>; 256],
}

static TABLES: OnceLock<OpCodeTables> = OnceLock::new();

fn tables() -> &'static OpCodeTables {
    TABLES.get_or_init(|| {
        let mut tables = OpCodeTables {
            one_byte: [None; 256],
            two_byte: [None; 256],
        };

        for opcode in OPCODE_DEFINITIONS {
            let [high, low] = opcode.value.to_be_bytes();
            if high == TWO_BYTE_ESCAPE {
                tables.two_byte[low as usize] = Some(opcode);
            } else if high == 0 && low != TWO_BYTE_ESCAPE {
                tables.one_byte[low as usize] = Some(opcode);
            }
        }

        tables
    })
}

/// Looks up a single-byte opcode. Returns `None` for undefined values and for the escape byte.
#[must_use]
pub fn one_byte(value: u8) -> Option<&'static OpCode> {
    tables().one_byte[value as usize]
}

/// Looks up the second byte of a two-byte opcode.
#[must_use]
pub fn two_byte(value: u8) -> Option<&'static OpCode> {
    tables().two_byte[value as usize]
}

/// Classifies the leading byte(s) of an instruction.
///
/// `next` is only consulted when `first` is [`TWO_BYTE_ESCAPE`]; a missing second byte yields
/// `None` like any undefined value.
#[must_use]
pub fn lookup(first: u8, next: Option<u8>) -> Option<&'static OpCode> {
    if first == TWO_BYTE_ESCAPE {
        next.and_then(two_byte)
    } else {
        one_byte(first)
    }
}

/// Iterates over every defined opcode, one-byte opcodes first.
pub fn opcodes() -> impl Iterator<Item = &'static OpCode> {
    OPCODE_DEFINITIONS.iter()
}
