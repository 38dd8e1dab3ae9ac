//! Native argument values and the rule that tags them for the wire.

use crate::message::{Tag, TypedArgument};
use serde_json::Value;

/// A native argument value, before tagging.
///
/// The set of categories is closed: every value maps to exactly one [`Tag`],
/// so encoding never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    /// Opaque bytes, written as an array of byte values.
    Blob(Vec<u8>),
    Array(Vec<Argument>),
    /// Key/value pairs, written in order. A repeated key keeps the position of its
    /// first occurrence and the value of its last one.
    Object(Vec<(String, Argument)>),
    Nil,
}

/// Returns `x` as an integer if it is finite, has no fractional part, and fits in an `i64`.
#[inline(always)]
fn as_whole(x: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    (x.is_finite() && x.fract() == 0. && x >= i64::MIN as f64 && x < i64::MAX as f64)
        .then_some(x as i64)
}

impl Argument {
    #[inline(always)]
    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Blob(bytes.into())
    }

    /// Infers the wire tag of this value.
    ///
    /// Whole floating-point numbers (e.g. `3.0`) are tagged as integers. Booleans, blobs
    /// and nil have no dedicated tag and fall through to [`Tag::Blob`].
    #[inline]
    pub fn tag(&self) -> Tag {
        match self {
            Self::String(_) => Tag::String,
            Self::Int(_) => Tag::Int,
            Self::Float(x) if as_whole(*x).is_some() => Tag::Int,
            Self::Float(_) => Tag::Float,
            Self::Array(_) => Tag::Array,
            Self::Object(_) => Tag::Object,
            Self::Bool(_) | Self::Blob(_) | Self::Nil => Tag::Blob,
        }
    }

    /// Converts this value into its JSON form, without a tag.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => i.into(),
            Self::Float(x) => match as_whole(x) {
                Some(i) => Value::from(i),
                None => Value::from(x),
            },
            Self::String(s) => s.into(),
            Self::Bool(b) => b.into(),
            Self::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_value).collect()),
            Self::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect(),
            ),
            Self::Nil => Value::Null,
        }
    }

    #[inline]
    pub fn into_typed(self) -> TypedArgument {
        TypedArgument {
            tag: self.tag(),
            value: self.into_value(),
        }
    }
}

impl From<Argument> for TypedArgument {
    #[inline(always)]
    fn from(arg: Argument) -> Self {
        arg.into_typed()
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Argument {
                #[inline(always)]
                fn from(v: $t) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f64 => Float,
    bool => Bool,
    String => String,
    &str => String,
    Vec<Argument> => Array,
}

/// Goes through the shortest decimal form of `v`, so `42.24f32` is sent as `42.24`
/// rather than its exact widened value.
impl From<f32> for Argument {
    #[inline]
    fn from(v: f32) -> Self {
        Self::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

/// Values above `i64::MAX` become floats, losing precision.
impl From<u64> for Argument {
    #[inline]
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Float(v as f64), Self::Int)
    }
}

impl From<usize> for Argument {
    #[inline(always)]
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl From<()> for Argument {
    #[inline(always)]
    fn from((): ()) -> Self {
        Self::Nil
    }
}
