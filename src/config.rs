//! Runtime configuration for the tree engine.

/// Storage settings for a container.
///
/// `capacity` pre-reserves room for that many entries. `max_len` caps the
/// number of live entries; an insert past the cap is reported as an
/// allocation failure.
///
/// The engine also reports an allocation failure once the slot map reaches
/// its `u32::MAX - 1` entry limit. Growing the slot map below that limit
/// uses the global allocator, which aborts on exhaustion; set `capacity` to
/// pre-allocate, or `max_len` to refuse inserts before that point.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub capacity: usize,
    pub max_len: Option<usize>,
}

impl Config {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub(crate) fn admits(&self, len: usize) -> bool {
        self.max_len.map_or(true, |max| len < max)
    }
}
