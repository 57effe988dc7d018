use crate::util::LsaBuffer;

/// Iterates over an array of `count` items returned by an LSA enumeration call. The buffer is
/// owned by LSA and released when the iterator is dropped.
pub(crate) struct LsaArrayIterator<T> {
    buffer: LsaBuffer<T>,
    count: usize,
    next: usize,
}

impl<T> LsaArrayIterator<T> {
    /// # Safety
    ///
    /// `buffer` must be NULL or point to at least `count` initialized items allocated by LSA.
    pub(crate) unsafe fn new(buffer: *mut T, count: u32) -> LsaArrayIterator<T> {
        LsaArrayIterator {
            buffer: LsaBuffer(buffer),
            count: if buffer.is_null() { 0 } else { count as usize },
            next: 0,
        }
    }
}

impl<T: Copy> Iterator for LsaArrayIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        // Items may hold pointers into the same buffer; they are only valid while it lives, so
        // callers copy out what they need before dropping the iterator.
        let item = unsafe { *self.buffer.0.add(self.next) };
        self.next += 1;
        Some(item)
    }
}
