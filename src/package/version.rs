//! Ordering of free-form library versions.
//!
//! Versions are compared segment by segment after splitting on `.`, so
//! `1.10.0` is newer than `1.4.1` even though it sorts lower as a string.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    // Variant order matters: numeric segments sort before textual ones
    Numeric(u64),
    Text(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => Segment::Numeric(n),
            Err(_) => Segment::Text(raw),
        }
    }
}

const MISSING: Segment<'static> = Segment::Numeric(0);

/// Version comparator - pure functions over version strings.
pub struct VersionComparator;

impl VersionComparator {
    /// Compare two versions.
    ///
    /// Segments compare numerically when both are numbers and as strings when
    /// both are text; a number sorts before text. A missing trailing segment
    /// counts as `0`, so `1.4` and `1.4.0` are equal.
    pub fn compare(a: &str, b: &str) -> Ordering {
        let left: Vec<Segment> = a.split('.').map(Segment::parse).collect();
        let right: Vec<Segment> = b.split('.').map(Segment::parse).collect();

        for i in 0..left.len().max(right.len()) {
            let l = left.get(i).unwrap_or(&MISSING);
            let r = right.get(i).unwrap_or(&MISSING);
            match l.cmp(r) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Sort in place, newest first.
    pub fn sort_descending<T, F>(items: &mut [T], version_of: F)
    where
        F: Fn(&T) -> &str,
    {
        items.sort_by(|a, b| Self::compare(version_of(b), version_of(a)));
    }

    /// The newest of `versions`, if any.
    pub fn newest<'a, I>(versions: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        versions.into_iter().max_by(|a, b| Self::compare(a, b))
    }
}
