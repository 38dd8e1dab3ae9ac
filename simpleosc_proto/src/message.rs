//! Envelope types exchanged with the bridge.

use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single-character classifier identifying an argument's wire-level type.
///
/// On the wire, a tag is serialized as its one-character string, e.g. `"i"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Whole number, `i`.
    #[serde(rename = "i")]
    Int,
    /// Non-integral number, `f`.
    #[serde(rename = "f")]
    Float,
    /// Text, `s`.
    #[serde(rename = "s")]
    String,
    /// Catch-all for everything without a more specific tag, `b`.
    #[serde(rename = "b")]
    Blob,
    /// Key/value composite, `o`.
    #[serde(rename = "o")]
    Object,
    /// Ordered sequence, `a`.
    #[serde(rename = "a")]
    Array,
}

impl Tag {
    pub const ALL: [Tag; 6] = [
        Tag::Int,
        Tag::Float,
        Tag::String,
        Tag::Blob,
        Tag::Object,
        Tag::Array,
    ];

    /// Returns the character used for this tag on the wire.
    #[inline(always)]
    pub const fn as_char(self) -> char {
        use Tag::*;
        match self {
            Int => 'i',
            Float => 'f',
            String => 's',
            Blob => 'b',
            Object => 'o',
            Array => 'a',
        }
    }
}

impl fmt::Display for Tag {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Error returned when converting a character that isn't a known [`Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("unknown argument tag '{0}'")]
pub struct UnknownTag(pub char);

impl TryFrom<char> for Tag {
    type Error = UnknownTag;

    #[inline]
    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_char() == c)
            .ok_or(UnknownTag(c))
    }
}

/// An argument paired with its wire tag.
///
/// The value is kept as raw JSON: received arguments are passed through
/// exactly as the peer sent them, with no coercion against the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedArgument {
    #[serde(rename = "type")]
    pub tag: Tag,
    pub value: Value,
}

impl TypedArgument {
    #[inline(always)]
    pub fn new(tag: Tag, value: impl Into<Value>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// The unit of transmission: an address and its ordered, tagged arguments.
///
/// ```text
/// { "address": "/browser/status", "args": [ { "type": "s", "value": "Hello" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub address: String,
    pub args: Vec<TypedArgument>,
}

impl Envelope {
    /// Creates an envelope with no arguments.
    #[inline(always)]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    #[inline]
    pub fn with_args(
        address: impl Into<String>,
        args: impl IntoIterator<Item = TypedArgument>,
    ) -> Self {
        Self {
            address: address.into(),
            args: args.into_iter().collect(),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, arg: TypedArgument) {
        self.args.push(arg)
    }

    /// Number of arguments.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Serializes the envelope into compact wire text.
    #[inline]
    pub fn to_json(&self) -> Result<String, crate::Error> {
        serde_json::to_string(self).map_err(crate::Error::Serialize)
    }
}

/// Displays a JSON value the way it reads in log lines: strings without
/// quotes, arrays as their elements joined by `,`, everything else as JSON.
#[derive(Debug, Clone, Copy)]
pub struct Bare<'a>(pub &'a Value);

impl fmt::Display for Bare<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", Bare(item))?;
                }
                Ok(())
            }
            other => write!(f, "{other}"),
        }
    }
}
