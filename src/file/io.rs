//! Little-endian primitive reads over a byte slice and a caller-owned cursor.
//!
//! CIL stores every multi-byte operand in little-endian order. The [`CilIO`] trait abstracts the
//! conversion from a fixed-size byte array to a primitive so that [`read_le_at`] can serve every
//! operand width the instruction set uses: `u8`/`i8` for short forms, `u16` for variable indices,
//! `i32`/`u32` for branch deltas, tokens and switch tables, `i64` and the two float widths for
//! constants.

use crate::Result;

/// A primitive that can be decoded from its little-endian byte representation.
pub trait CilIO: Sized {
    /// The fixed-size byte array holding one encoded value
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads a `T` at `*offset` and advances the offset past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain. The offset
/// is left unchanged in that case.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };

    let Some(slice) = data.get(*offset..end) else {
        return Err(out_of_bounds_error!());
    };

    let Ok(read) = slice.try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_sequence() {
        let data = [0x2A, 0xFF, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut offset = 0;

        assert_eq!(read_le_at::<u8>(&data, &mut offset).unwrap(), 0x2A);
        assert_eq!(read_le_at::<i8>(&data, &mut offset).unwrap(), -1);
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 0x1234);
        assert_eq!(read_le_at::<i32>(&data, &mut offset).unwrap(), 0x1234_5678);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_floats() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut offset = 0;

        assert_eq!(read_le_at::<f32>(&data, &mut offset).unwrap(), 1.5);
        assert_eq!(read_le_at::<f64>(&data, &mut offset).unwrap(), -2.25);
    }

    #[test]
    fn read_past_end() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 1;

        let result = read_le_at::<u32>(&data, &mut offset);
        assert!(matches!(result, Err(Error::OutOfBounds)));
        assert_eq!(offset, 1);
    }

    #[test]
    fn read_offset_overflow() {
        let data = [0x01];
        let mut offset = usize::MAX;

        assert!(read_le_at::<u16>(&data, &mut offset).is_err());
    }
}
