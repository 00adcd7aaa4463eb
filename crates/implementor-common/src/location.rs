/// An opaque position in the translation unit: a byte offset into its buffer.
///
/// Locations produced by the front-end always point at the first byte of a
/// token. `SourceLocation::INVALID` stands for "no location".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation(u32);

impl SourceLocation {
    pub const INVALID: SourceLocation = SourceLocation(u32::MAX);

    pub fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn is_invalid(self) -> bool {
        !self.is_valid()
    }

    /// Raw byte offset. Meaningless for an invalid location.
    pub fn offset(self) -> u32 {
        self.0
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A half-open byte range `[begin, end)` of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    begin: SourceLocation,
    end: SourceLocation,
}

impl SourceRange {
    pub fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        debug_assert!(begin.is_invalid() || end.is_invalid() || begin <= end);
        Self { begin, end }
    }

    pub fn from_offsets(begin: u32, end: u32) -> Self {
        Self::new(SourceLocation::new(begin), SourceLocation::new(end))
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SourceLocation {
        self.begin
    }

    pub fn end(&self) -> SourceLocation {
        self.end
    }

    pub fn is_valid(&self) -> bool {
        self.begin.is_valid() && self.end.is_valid()
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    pub fn len(&self) -> u32 {
        if self.is_valid() {
            self.end.0 - self.begin.0
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest range covering both.
    pub fn merge(self, other: SourceRange) -> SourceRange {
        if self.is_invalid() {
            return other;
        }
        if other.is_invalid() {
            return self;
        }
        SourceRange {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, loc: SourceLocation) -> bool {
        self.is_valid() && loc.is_valid() && self.begin <= loc && loc < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_is_invalid() {
        assert!(SourceLocation::default().is_invalid());
        assert!(SourceLocation::new(0).is_valid());
    }

    #[test]
    fn test_invalid_range_is_empty() {
        let range = SourceRange::invalid();
        assert!(range.is_invalid());
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
    }

    #[test]
    fn test_merge_ignores_invalid_side() {
        let a = SourceRange::from_offsets(4, 9);
        let b = SourceRange::from_offsets(1, 6);
        assert_eq!(a.merge(b), SourceRange::from_offsets(1, 9));
        assert_eq!(a.merge(SourceRange::invalid()), a);
        assert_eq!(SourceRange::invalid().merge(b), b);
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = SourceRange::from_offsets(2, 5);
        assert!(range.contains(SourceLocation::new(2)));
        assert!(range.contains(SourceLocation::new(4)));
        assert!(!range.contains(SourceLocation::new(5)));
        assert!(!range.contains(SourceLocation::INVALID));
    }
}
