//! IMAP message-number sets.
//!
//! A [`NumberSequence`] is either a contiguous range or an explicit list.
//! Union always produces a list: ranges are expanded, duplicates removed,
//! left operand first.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, RangeInclusive};
use std::str::FromStr;

use crate::{Error, Result};

/// A set of message numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberSequence {
    /// `first:last`, inclusive.
    Range {
        /// First number.
        first: u32,
        /// Last number.
        last: u32,
    },
    /// Explicit numbers, in stored order.
    List(Vec<u32>),
}

impl Default for NumberSequence {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl NumberSequence {
    /// `count` consecutive numbers starting at `first`.
    ///
    /// A zero count gives an empty list.
    #[must_use]
    pub const fn create_range(first: u32, count: u32) -> Self {
        if count == 0 {
            return Self::List(Vec::new());
        }
        Self::Range {
            first,
            last: first.saturating_add(count - 1),
        }
    }

    /// A list of the given numbers, order kept.
    #[must_use]
    pub fn create_list(numbers: impl IntoIterator<Item = u32>) -> Self {
        Self::List(numbers.into_iter().collect())
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Range { first, last } if last < first => 0,
            Self::Range { first, last } => {
                usize::try_from(last - first).map_or(usize::MAX, |n| n.saturating_add(1))
            }
            Self::List(numbers) => numbers.len(),
        }
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for the range variant.
    #[must_use]
    pub const fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// Returns true if `n` is a member.
    #[must_use]
    pub fn contains(&self, n: u32) -> bool {
        match self {
            Self::Range { first, last } => (*first..=*last).contains(&n),
            Self::List(numbers) => numbers.contains(&n),
        }
    }

    /// Sorts a list ascending. Ranges are left alone.
    pub fn sort(&mut self) {
        if let Self::List(numbers) = self {
            numbers.sort_unstable();
        }
    }

    /// Iterates over the members. Each call starts from the beginning.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        match self {
            Self::Range { first, last } => Iter::Range(*first..=*last),
            Self::List(numbers) => Iter::List(numbers.iter()),
        }
    }

    /// Members as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Members of `self`, then members of `other` not already present.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut seen = HashSet::new();
        let numbers = self
            .iter()
            .chain(other.iter())
            .filter(|n| seen.insert(*n))
            .collect();
        Self::List(numbers)
    }

    fn parse_token(token: &str) -> Result<Self> {
        let number = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| Error::ProtocolFormat(format!("bad sequence number {s:?}")))
        };
        match token.split_once(':') {
            Some((a, b)) => {
                let (a, b) = (number(a)?, number(b)?);
                Ok(Self::Range {
                    first: a.min(b),
                    last: a.max(b),
                })
            }
            None => Ok(Self::List(vec![number(token)?])),
        }
    }
}

impl FromStr for NumberSequence {
    type Err = Error;

    /// Parses `"3,5,7:9"`, `"2 4 6"` or `"(1:3)"`.
    ///
    /// The result is the union of the tokens, so it is always a list.
    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        inner
            .split([' ', ','])
            .filter(|t| !t.is_empty())
            .map(Self::parse_token)
            .try_fold(Self::default(), |acc, token| -> Result<Self> {
                Ok(acc.union(&token?))
            })
    }
}

impl fmt::Display for NumberSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { first, last } => write!(f, "{first}:{last}"),
            Self::List(numbers) => {
                for (i, n) in numbers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{n}")?;
                }
                Ok(())
            }
        }
    }
}

impl Add for NumberSequence {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.union(&rhs)
    }
}

impl Add for &NumberSequence {
    type Output = NumberSequence;

    fn add(self, rhs: Self) -> NumberSequence {
        self.union(rhs)
    }
}

/// Iterator over a [`NumberSequence`].
#[derive(Debug, Clone)]
pub enum Iter<'a> {
    /// Counting through a range.
    Range(RangeInclusive<u32>),
    /// Walking a list.
    List(std::slice::Iter<'a, u32>),
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match self {
            Self::Range(range) => range.next(),
            Self::List(list) => list.next().copied(),
        }
    }
}

impl<'a> IntoIterator for &'a NumberSequence {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
