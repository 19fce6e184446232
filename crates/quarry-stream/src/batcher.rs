//! Fixed-size chunking of a (possibly unbounded) sequence.

use quarry_core::errors::{QuarryError, QuarryResult};

/// Groups consecutive items of `inner` into `Vec`s of `size` items.
///
/// Order is preserved and nothing is dropped or duplicated. When the source
/// ends, the trailing partial chunk is yielded if non-empty. On an infinite
/// source every chunk is full.
#[derive(Debug, Clone)]
pub struct RecordBatcher<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> RecordBatcher<I> {
    pub fn new(inner: I, size: usize) -> QuarryResult<Self> {
        if size == 0 {
            return Err(QuarryError::InvalidArgument {
                reason: "batch size must be at least 1".to_string(),
            });
        }
        Ok(Self { inner, size })
    }

    /// Chunk size.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<I: Iterator> Iterator for RecordBatcher<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.inner.next()?;
        let mut chunk = Vec::with_capacity(self.size);
        chunk.push(first);
        while chunk.len() < self.size {
            match self.inner.next() {
                Some(item) => chunk.push(item),
                None => break,
            }
        }
        Some(chunk)
    }
}

/// `.batched(size)` on any iterator.
pub trait BatchExt: Iterator + Sized {
    fn batched(self, size: usize) -> QuarryResult<RecordBatcher<Self>> {
        RecordBatcher::new(self, size)
    }
}

impl<I: Iterator> BatchExt for I {}
