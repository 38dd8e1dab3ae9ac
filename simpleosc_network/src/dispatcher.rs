//! Default, line-oriented rendering of received envelopes.
//!
//! Used by [`print_envelope`](crate::client::print_envelope). It's only a
//! visualizer and carries no protocol significance.
//!
//! ```text
//! received/	address: /foo
//! 		args: 1:i'7' 2:s'hello'
//! ```

use core::fmt::Write;
use simpleosc_proto::{
    Envelope,
    message::Bare,
    serde_json::{Map, Value},
};

const PREFIX: &str = "received/";

/// Renders an envelope, one entry per line.
pub fn render(envelope: &Envelope) -> Vec<String> {
    let args = envelope
        .args
        .iter()
        .map(|arg| {
            let mut fields = Map::new();
            fields.insert("type".into(), arg.tag.to_string().into());
            fields.insert("value".into(), arg.value.clone());
            Value::Object(fields)
        })
        .collect();

    let mut fields = Map::new();
    fields.insert("address".into(), envelope.address.clone().into());
    fields.insert("args".into(), Value::Array(args));

    render_fields(&fields)
}

#[inline(always)]
fn field<'a>(arg: &'a Value, name: &str) -> &'a Value {
    arg.get(name).unwrap_or(&Value::Null)
}

/// Renders the top-level fields of any JSON document, in the order they were received.
///
/// The first field is shown on the `received/` line. A later `args` array is
/// shown as `<n>:<type>'<value>'` entries, numbered from 1. A document without
/// fields renders as `received/\tEMPTY`.
pub fn render_fields(fields: &Map<String, Value>) -> Vec<String> {
    let mut iter = fields.iter();

    let Some((key, value)) = iter.next() else {
        return vec![format!("{PREFIX}\tEMPTY")];
    };

    let mut lines = Vec::with_capacity(fields.len());
    lines.push(format!("{PREFIX}\t{key}: {}", Bare(value)));

    for (key, value) in iter {
        let line = match value {
            Value::Array(args) if key == "args" => {
                let mut line = format!("\t\t{key}: ");
                for (idx, arg) in args.iter().enumerate() {
                    // writing into a String can't fail
                    let _ = write!(
                        line,
                        "{}:{}'{}' ",
                        idx + 1,
                        Bare(field(arg, "type")),
                        Bare(field(arg, "value"))
                    );
                }
                line
            }
            _ => format!("\t\t{key}: {}", Bare(value)),
        };

        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use simpleosc_proto::{Argument, encode, serde_json::json};

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn renders_address_then_args() {
        let env = encode(
            "/foo",
            [
                Argument::from(7),
                "hello".into(),
                Argument::from(vec![Argument::from(1), 2.into()]),
            ],
        );

        assert_eq!(
            render(&env),
            ["received/\taddress: /foo", "\t\targs: 1:i'7' 2:s'hello' 3:a'1,2' "]
        );
    }

    #[test]
    fn no_args() {
        assert_eq!(
            render(&Envelope::new("/bare")),
            ["received/\taddress: /bare", "\t\targs: "]
        );
    }

    #[test]
    fn empty_document() {
        assert_eq!(render_fields(&Map::new()), ["received/\tEMPTY"]);
    }

    #[test]
    fn other_fields() {
        let doc = fields(json!({"address": "/x", "args": [], "zeta": [true, null]}));

        assert_eq!(
            render_fields(&doc),
            ["received/\taddress: /x", "\t\targs: ", "\t\tzeta: true,null"]
        );
    }

    #[test]
    fn fields_keep_received_order() {
        let doc = simpleosc_proto::serde_json::from_str(r#"{"zeta":1,"args":[],"alpha":"a"}"#)
            .unwrap();

        assert_eq!(
            render_fields(&doc),
            ["received/\tzeta: 1", "\t\targs: ", "\t\talpha: a"]
        );
    }

    #[test]
    fn args_entries_without_fields() {
        let doc = fields(json!({"address": "/x", "args": [5]}));

        assert_eq!(render_fields(&doc)[1], "\t\targs: 1:null'null' ");
    }

    #[test]
    fn deterministic() {
        let env = encode("/d", [Argument::from(1.5), false.into()]);
        assert_eq!(render(&env), render(&env.clone()));
    }
}
