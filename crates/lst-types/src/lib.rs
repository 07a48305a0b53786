//! Validated primitive types shared across the LST workspace.
//!
//! These newtypes exist so that invariants the tracking engine relies on
//! (non-empty identifiers, the bounded position-in-batch counter) are
//! enforced at construction time rather than re-checked at every use site.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is automatically trimmed of leading
/// and trailing whitespace during construction. Package labels, facility
/// names and subject names are all carried as `NonEmptyText`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Maximum number of specimens a single batch may hold.
///
/// Position-in-batch values run from 1 to this bound inclusive. The bound is
/// enforced in exactly one place: [`BatchPosition::new`].
pub const BATCH_CAPACITY: u16 = 255;

/// Errors that can occur when creating a [`BatchPosition`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// Positions are one-based; zero is never a valid slot
    #[error("batch positions start at 1")]
    Zero,
    /// The position would exceed the batch capacity bound
    #[error("batch position {0} exceeds capacity of {BATCH_CAPACITY}")]
    ExceedsCapacity(u16),
}

/// A capacity-checked position-in-batch counter.
///
/// Wraps the ordinal slot a specimen occupies within its batch. Values are
/// guaranteed to lie in `1..=BATCH_CAPACITY`, so downstream code can treat a
/// `BatchPosition` as proof that the batch bound was honoured when the slot
/// was allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchPosition(u16);

impl BatchPosition {
    /// The first slot of every batch.
    pub const FIRST: BatchPosition = BatchPosition(1);

    /// Creates a position, rejecting zero and anything past the capacity
    /// bound.
    pub fn new(value: u16) -> Result<Self, PositionError> {
        if value == 0 {
            return Err(PositionError::Zero);
        }
        if value > BATCH_CAPACITY {
            return Err(PositionError::ExceedsCapacity(value));
        }
        Ok(Self(value))
    }

    /// Returns the position following this one, or an error when the batch
    /// is already at capacity.
    pub fn next(self) -> Result<Self, PositionError> {
        Self::new(self.0 + 1)
    }

    /// The raw one-based slot number.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for BatchPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for BatchPosition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for BatchPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u16::deserialize(deserializer)?;
        BatchPosition::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  PKG-001  ").expect("valid text");
        assert_eq!(text.as_str(), "PKG-001");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
    }

    #[test]
    fn position_accepts_full_range() {
        assert_eq!(BatchPosition::new(1).expect("first slot").get(), 1);
        assert_eq!(
            BatchPosition::new(BATCH_CAPACITY).expect("last slot").get(),
            BATCH_CAPACITY
        );
    }

    #[test]
    fn position_rejects_zero_and_overflow() {
        assert_eq!(BatchPosition::new(0), Err(PositionError::Zero));
        assert_eq!(
            BatchPosition::new(BATCH_CAPACITY + 1),
            Err(PositionError::ExceedsCapacity(BATCH_CAPACITY + 1))
        );
    }

    #[test]
    fn next_fails_at_capacity() {
        let last = BatchPosition::new(BATCH_CAPACITY).expect("last slot");
        assert_eq!(
            last.next(),
            Err(PositionError::ExceedsCapacity(BATCH_CAPACITY + 1))
        );

        let first = BatchPosition::FIRST;
        assert_eq!(first.next().expect("second slot").get(), 2);
    }
}
