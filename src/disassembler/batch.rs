//! Parallel rendering of many method bodies.
//!
//! Each [`MethodJob`] gets its own [`Decoder`]; jobs run on the `rayon` thread pool and share
//! nothing but the opcode tables and whatever resolvers the caller handed in.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    disassembler::{
        decoder::Decoder,
        format::{DefaultFormatProvider, FormatProvider},
    },
    metadata::TokenResolver,
    Result,
};

/// One method body to render, with the resolver for its tokens.
#[derive(Clone)]
pub struct MethodJob {
    bytes: Arc<[u8]>,
    resolver: Arc<dyn TokenResolver>,
    format: Arc<dyn FormatProvider>,
}

impl MethodJob {
    /// Creates a job rendered with [`DefaultFormatProvider`].
    pub fn new(bytes: impl Into<Arc<[u8]>>, resolver: Arc<dyn TokenResolver>) -> Self {
        MethodJob {
            bytes: bytes.into(),
            resolver,
            format: Arc::new(DefaultFormatProvider),
        }
    }

    /// Renders this job with `format` instead.
    #[must_use]
    pub fn with_format_provider(mut self, format: Arc<dyn FormatProvider>) -> Self {
        self.format = format;
        self
    }

    fn render(&self) -> Result<String> {
        Decoder::new(Arc::clone(&self.bytes), Arc::clone(&self.resolver))
            .with_format_provider(Arc::clone(&self.format))
            .text()
    }
}

/// Renders every job to its text block, in parallel.
///
/// The result at index `i` belongs to `jobs[i]`. A fatal decoding error in one job does not
/// affect the others.
///
/// # Examples
///
/// ```rust
/// use ilscope::{disassembler::{render_batch, MethodJob}, metadata::ScopeTokenResolver};
/// use std::sync::Arc;
///
/// let scope = Arc::new(ScopeTokenResolver::new());
/// let jobs = vec![
///     MethodJob::new(vec![0x2A], scope.clone()),
///     MethodJob::new(vec![0xFE, 0xFF], scope),
/// ];
///
/// let rendered = render_batch(&jobs);
/// assert_eq!(rendered[0].as_ref().unwrap(), "IL_0000: ret        \n");
/// assert!(rendered[1].is_err());
/// ```
pub fn render_batch(jobs: &[MethodJob]) -> Vec<Result<String>> {
    jobs.par_iter().map(MethodJob::render).collect()
}
