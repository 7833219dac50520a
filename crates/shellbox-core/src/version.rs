use std::cmp::Ordering;
use std::fmt;

/// A dotted version string tokenized into (number, suffix) pairs.
///
/// Each `.`-separated token is a run of leading ASCII digits followed by an
/// arbitrary suffix; a missing number reads as 0 and a missing suffix as the
/// empty string. An empty suffix outranks a non-empty one at the same number,
/// so `1.2` sorts above `1.2b`, and trailing zero tokens are insignificant
/// (`1.2` equals `1.2.0`).
#[derive(Debug, Clone)]
pub struct Version {
    tokens: Vec<VersionToken>,
    raw: String,
}

// Equality must agree with the ordering, which treats trailing zero tokens
// as insignificant, so it cannot be derived from the fields.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionToken {
    number: u64,
    suffix: String,
}

impl VersionToken {
    fn is_significant(&self) -> bool {
        self.number != 0 || !self.suffix.is_empty()
    }
}

impl Version {
    /// Tokenization never fails: a token with no leading digits is number 0
    /// with the whole token captured as suffix.
    pub fn parse(input: &str) -> Self {
        let raw = input.trim();
        let mut tokens = Vec::new();
        if !raw.is_empty() {
            for piece in raw.split('.') {
                let digits_end = piece
                    .find(|ch: char| !ch.is_ascii_digit())
                    .unwrap_or(piece.len());
                let number = piece[..digits_end].parse::<u64>().unwrap_or(0);
                tokens.push(VersionToken {
                    number,
                    suffix: piece[digits_end..].to_string(),
                });
            }
        }
        Self {
            tokens,
            raw: raw.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let length = self.tokens.len().max(other.tokens.len());
        for index in 0..length {
            match (self.tokens.get(index), other.tokens.get(index)) {
                (Some(left), Some(right)) => {
                    match left.number.cmp(&right.number) {
                        Ordering::Equal => {}
                        decided => return decided,
                    }
                    match (left.suffix.is_empty(), right.suffix.is_empty()) {
                        (true, true) => {}
                        // Release outranks pre-release: 1.2 > 1.2b.
                        (true, false) => return Ordering::Greater,
                        (false, true) => return Ordering::Less,
                        (false, false) => match left.suffix.cmp(&right.suffix) {
                            Ordering::Equal => {}
                            decided => return decided,
                        },
                    }
                }
                // The longer side wins only once a remaining token is
                // non-zero; all-zero tails compare equal.
                (Some(left), None) => {
                    if left.is_significant() {
                        return Ordering::Greater;
                    }
                }
                (None, Some(right)) => {
                    if right.is_significant() {
                        return Ordering::Less;
                    }
                }
                (None, None) => return Ordering::Equal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn compare_versions(left: &str, right: &str) -> Ordering {
    Version::parse(left).cmp(&Version::parse(right))
}
