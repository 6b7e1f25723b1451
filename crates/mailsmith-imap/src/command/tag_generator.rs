//! IMAP command tag generator.
//!
//! Tags are used to match commands with their completion lines.

/// Per-connection tag source.
///
/// Tags are the counter rendered as uppercase hex, at least two digits:
/// `01`, `02`, ... `FF`, `100`. Each connection owns its own generator.
#[derive(Debug, Clone, Default)]
pub struct TagGenerator {
    counter: u32,
}

impl TagGenerator {
    /// Creates a generator whose first tag is `01`.
    #[must_use]
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Advances the counter and returns the new tag.
    pub fn next_tag(&mut self) -> String {
        self.counter = self.counter.wrapping_add(1);
        format!("{:02X}", self.counter)
    }

    /// Number of tags handed out so far.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.counter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_generation() {
        let mut generator = TagGenerator::new();
        assert_eq!(generator.next_tag(), "01");
        assert_eq!(generator.next_tag(), "02");
        assert_eq!(generator.current(), 2);
    }

    #[test]
    fn test_hex_rendering() {
        let mut generator = TagGenerator::new();
        let tags: Vec<String> = (0..256).map(|_| generator.next_tag()).collect();
        assert_eq!(tags[9], "0A");
        assert_eq!(tags[254], "FF");
        assert_eq!(tags[255], "100");
    }

    #[test]
    fn test_generators_are_independent() {
        let mut a = TagGenerator::new();
        let mut b = TagGenerator::new();
        assert_eq!(a.next_tag(), "01");
        assert_eq!(a.next_tag(), "02");
        assert_eq!(b.next_tag(), "01");
    }

    #[test]
    fn test_uniqueness() {
        let mut generator = TagGenerator::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generator.next_tag()), "duplicate tag generated");
        }
    }
}
