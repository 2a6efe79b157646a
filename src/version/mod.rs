// src/version/mod.rs

//! Loose version comparison for add-on archives
//!
//! Add-on versions are free-form strings (`1.2.10`, `2.0.0b3`, `19.1.0+matrix.1`)
//! and cannot go through a strict semver parser. A version is broken into tokens:
//! runs of digits, runs of letters, and any other single character. Dots only
//! separate tokens and are dropped.
//!
//! Token lists compare pairwise:
//! - two numbers compare numerically
//! - two text tokens compare lexically
//! - a number is greater than a text token
//! - when one list is a prefix of the other, the longer list is greater

use std::cmp::Ordering;
use std::fmt;

/// A single component of a loose version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionToken {
    /// Run of ASCII digits with leading zeros stripped ("0" for an all-zero run)
    Numeric(String),
    /// Letter run or a lone punctuation character
    Text(String),
}

impl VersionToken {
    fn numeric(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Self::Numeric("0".to_string())
        } else {
            Self::Numeric(trimmed.to_string())
        }
    }

    fn compare(&self, other: &VersionToken) -> Ordering {
        match (self, other) {
            // Digit runs can exceed u64, so compare by length first
            (Self::Numeric(a), Self::Numeric(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Text(_)) => Ordering::Greater,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Less,
        }
    }
}

/// A version string with its comparison tokens
#[derive(Debug, Clone)]
pub struct LooseVersion {
    original: String,
    tokens: Vec<VersionToken>,
}

impl LooseVersion {
    /// Tokenize a version string. Never fails: anything unrecognised is a text token.
    pub fn parse(s: &str) -> Self {
        Self {
            original: s.to_string(),
            tokens: tokenize(s),
        }
    }

    /// The version string as given
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn tokens(&self) -> &[VersionToken] {
        &self.tokens
    }

    /// Compare two loose versions
    pub fn compare(&self, other: &LooseVersion) -> Ordering {
        for (a, b) in self.tokens.iter().zip(other.tokens.iter()) {
            match a.compare(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.tokens.len().cmp(&other.tokens.len())
    }
}

fn tokenize(s: &str) -> Vec<VersionToken> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut run = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                run.push(d);
                chars.next();
            }
            tokens.push(VersionToken::numeric(&run));
        } else if c.is_alphabetic() {
            let mut run = String::new();
            while let Some(&l) = chars.peek() {
                if !l.is_alphabetic() {
                    break;
                }
                run.push(l);
                chars.next();
            }
            tokens.push(VersionToken::Text(run));
        } else {
            chars.next();
            if c != '.' {
                tokens.push(VersionToken::Text(c.to_string()));
            }
        }
    }

    tokens
}

/// Compare two version strings with loose semantics
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    LooseVersion::parse(a).compare(&LooseVersion::parse(b))
}

impl fmt::Display for LooseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl PartialEq for LooseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for LooseVersion {}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
