//! Obtaining the bytecode of a method that is still being generated.
//!
//! A runtime code generator keeps the bytecode of the method it emits in an internal buffer that
//! is only finalized ("baked") on request. Baking goes through a privileged path that can fail,
//! for instance when the method references tokens that are not final yet. [`MethodBody::extract`]
//! tries that path first and otherwise falls back to copying the generator's raw buffer, up to the
//! length the generator reports as valid.

use crate::Result;

/// The host's view of a method body under construction.
pub trait MethodBodySource {
    /// Finalizes the body and returns its bytecode.
    ///
    /// # Errors
    /// Returns [`crate::Error::Extraction`] (or any other error) if the privileged path is not
    /// available.
    fn bake(&self) -> Result<Vec<u8>>;

    /// The generator's internal buffer. Bytes past [`MethodBodySource::length`] are garbage.
    fn raw_stream(&self) -> &[u8];

    /// Number of valid bytes in [`MethodBodySource::raw_stream`]
    fn length(&self) -> usize;
}

/// Extracted bytecode of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    bytes: Vec<u8>,
    fixup_success: bool,
}

impl MethodBody {
    /// Extracts the bytecode of `source`.
    ///
    /// Never fails: if [`MethodBodySource::bake`] does, the valid prefix of the raw stream is
    /// used and [`MethodBody::fixup_success`] reports `false`.
    pub fn extract<S: MethodBodySource + ?Sized>(source: &S) -> Self {
        match source.bake() {
            Ok(bytes) => MethodBody {
                bytes,
                fixup_success: true,
            },
            Err(error) => {
                let raw = source.raw_stream();
                let length = source.length().min(raw.len());
                log::warn!(
                    "Method body extraction failed, using {} raw bytes instead: {}",
                    length,
                    error
                );

                MethodBody {
                    bytes: raw[..length].to_vec(),
                    fixup_success: false,
                }
            }
        }
    }

    /// The bytecode
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `true` if the bytecode came from the privileged path
    #[must_use]
    pub fn fixup_success(&self) -> bool {
        self.fixup_success
    }

    /// Consumes the body, returning the bytecode
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Generator {
        baked: Option<Vec<u8>>,
        stream: Vec<u8>,
        length: usize,
    }

    impl MethodBodySource for Generator {
        fn bake(&self) -> Result<Vec<u8>> {
            self.baked
                .clone()
                .ok_or_else(|| Error::Extraction("token fixups pending".to_string()))
        }

        fn raw_stream(&self) -> &[u8] {
            &self.stream
        }

        fn length(&self) -> usize {
            self.length
        }
    }

    #[test]
    fn extract_baked() {
        let generator = Generator {
            baked: Some(vec![0x00, 0x2A]),
            stream: vec![0xCC; 16],
            length: 2,
        };

        let body = MethodBody::extract(&generator);
        assert!(body.fixup_success());
        assert_eq!(body.bytes(), &[0x00, 0x2A]);
    }

    #[test]
    fn extract_fallback() {
        let generator = Generator {
            baked: None,
            stream: vec![0x16, 0x2A, 0x00, 0x00, 0x00, 0x00],
            length: 2,
        };

        let body = MethodBody::extract(&generator);
        assert!(!body.fixup_success());
        assert_eq!(body.into_bytes(), vec![0x16, 0x2A]);
    }

    #[test]
    fn extract_fallback_clamps_length() {
        let generator = Generator {
            baked: None,
            stream: vec![0x2A],
            length: 8,
        };

        let body = MethodBody::extract(&generator);
        assert!(!body.fixup_success());
        assert_eq!(body.bytes(), &[0x2A]);
    }
}
