/// Counts occurrences of a terminal query in a byte stream.
///
/// Up to `pattern.len() - 1` trailing bytes that could start a query are
/// kept between calls, so a query split across two reads is still
/// counted, and counted once.
#[derive(Debug)]
pub(crate) struct QueryScanner {
    pattern: &'static [u8],
    pending: Vec<u8>,
}

impl QueryScanner {
    pub(crate) fn new(pattern: &'static [u8]) -> Self {
        Self {
            pattern,
            pending: Vec::new(),
        }
    }

    /// Feed the next chunk and return how many queries it completes.
    pub(crate) fn scan(&mut self, bytes: &[u8]) -> usize {
        let mut window = std::mem::take(&mut self.pending);
        window.extend_from_slice(bytes);

        let count = window
            .windows(self.pattern.len())
            .filter(|candidate| *candidate == self.pattern)
            .count();

        let keep = (1..self.pattern.len())
            .rev()
            .find(|&len| window.ends_with(&self.pattern[..len]))
            .unwrap_or(0);
        self.pending = window[window.len() - keep..].to_vec();
        count
    }
}
