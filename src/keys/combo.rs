//! Key combinations in canonical form.
//!
//! A combination is a set of simultaneously held keys. It renders as
//! modifiers first in fixed order (`ctrl`, `alt`, `shift`), then the
//! remaining keys sorted lexicographically, joined by `+`. Two
//! combinations are the same binding iff their rendered strings match.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::normalize::{PLUS_TOKEN, normalize};

/// Separator between tokens in the rendered form.
pub const SEPARATOR: char = '+';

/// A canonical modifier. Declaration order is render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
}

impl Modifier {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" => Some(Self::Ctrl),
            "alt" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Alt => "alt",
            Self::Shift => "shift",
        }
    }
}

/// Combination parse error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComboError {
    #[error("combination is empty")]
    Empty,
    #[error("empty key name in '{0}'")]
    EmptyToken(String),
    #[error("'{0}' needs a non-modifier key or at least two modifiers")]
    SingleModifier(String),
}

/// A valid key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    modifiers: BTreeSet<Modifier>,
    keys: BTreeSet<String>,
}

impl Combination {
    /// Build a combination from canonical tokens.
    ///
    /// Returns `None` unless the tokens contain at least one non-modifier
    /// key or at least two distinct modifiers.
    pub fn from_tokens<'a, I>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut modifiers = BTreeSet::new();
        let mut keys = BTreeSet::new();
        for token in tokens {
            match Modifier::from_token(token) {
                Some(m) => {
                    modifiers.insert(m);
                }
                None if token == "+" => {
                    keys.insert(PLUS_TOKEN.to_string());
                }
                None => {
                    keys.insert(token.to_string());
                }
            }
        }

        if keys.is_empty() && modifiers.len() < 2 {
            return None;
        }
        Some(Self { modifiers, keys })
    }

    /// Parse a hand-written combination such as `"Shift+Ctrl+T"`.
    ///
    /// Each token is normalized, so the result is canonical regardless
    /// of the order or spelling of the input. The `+` key is `plus`, or a
    /// bare `+` in last position.
    pub fn parse(s: &str) -> Result<Self, ComboError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ComboError::Empty);
        }

        // A literal `+` key may be written last, as in `ctrl++`.
        let mut tokens = Vec::new();
        let body = if s == "+" {
            tokens.push(PLUS_TOKEN.to_string());
            ""
        } else if let Some(rest) = s.strip_suffix("++") {
            tokens.push(PLUS_TOKEN.to_string());
            rest
        } else {
            s
        };

        if !body.is_empty() {
            for part in body.split(SEPARATOR) {
                let part = part.trim();
                if part.is_empty() {
                    return Err(ComboError::EmptyToken(s.to_string()));
                }
                tokens.push(normalize(part));
            }
        }

        Self::from_tokens(tokens.iter().map(String::as_str))
            .ok_or_else(|| ComboError::SingleModifier(s.to_string()))
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    /// Non-modifier keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Tokens in render order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.modifiers
            .iter()
            .map(|m| m.token())
            .chain(self.keys.iter().map(String::as_str))
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

impl FromStr for Combination {
    type Err = ComboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
