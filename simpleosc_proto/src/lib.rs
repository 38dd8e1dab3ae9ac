//! A small codec for Open Sound Control (OSC)-style messages carried as JSON.
//!
//! This crate defines the envelope format spoken between an application and an
//! OSC bridge process, which translates each envelope into an actual OSC packet
//! on another transport (and vice versa).
//!
//! ## Wire format
//!
//! Every message is a single JSON document with exactly two top-level fields:
//!
//! ```text
//! { "address": "<string>", "args": [ { "type": "<tag>", "value": <any> }, ... ] }
//! ```
//!
//! There is no versioning field, checksum, or length prefix: the carrying
//! connection is expected to deliver whole messages.
//!
//! ## Tags
//!
//! Each argument is tagged with a single character, see [`Tag`]. Tags are never
//! supplied by callers: [`encode`] derives them from the native value category
//! of each [`Argument`]. Arguments with no dedicated tag (booleans, raw bytes,
//! nil) fall through to the blob tag, `b`.
//!
//! ## Decoding
//!
//! [`decode`] performs no coercion. Tags and values are passed through exactly
//! as received, so a peer may send, say, a string value tagged `i`.
//!
//! The types in this crate implement `serde`'s `Serialize` and `Deserialize`
//! traits, for plugging into other `serde` backends.

pub mod argument;
pub mod message;
pub use serde_json;

pub use argument::Argument;
pub use message::{Envelope, Tag, TypedArgument};

use core::fmt::Write;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A received payload isn't well-formed JSON, is missing the `address` or
    /// `args` fields, or uses an unknown argument tag.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Builds an envelope, tagging every argument.
///
/// The resulting envelope has exactly one typed argument per input, in the same
/// order. This never fails: every value maps to some tag.
#[inline]
pub fn encode<I>(address: impl Into<String>, args: I) -> Envelope
where
    I: IntoIterator,
    I::Item: Into<Argument>,
{
    Envelope::with_args(address, args.into_iter().map(|a| a.into().into_typed()))
}

/// Parses received wire text into an envelope.
#[inline]
pub fn decode(raw: &str) -> Result<Envelope, Error> {
    serde_json::from_str(raw).map_err(Error::MalformedEnvelope)
}

/// Renders an envelope for diagnostic output.
///
/// The first line holds the address, then each argument follows on its own
/// line as `\t<tag>/<value>`.
pub fn render_verbose(envelope: &Envelope) -> String {
    let mut out = envelope.address.clone();

    for arg in &envelope.args {
        // writing into a String can't fail
        let _ = write!(out, "\n\t{}/{}", arg.tag, message::Bare(&arg.value));
    }

    out
}
