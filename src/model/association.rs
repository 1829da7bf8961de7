use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

pub type Arguments = BTreeMap<String, String>;

/// A service attached to a destination, with the values for the service's
/// command arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub service: String,
    pub arguments: Arguments,
}

impl Association {
    pub fn new(service: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            service: service.into(),
            arguments,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid association list at byte {position}: {reason}")]
pub struct DecodeError {
    pub position: usize,
    pub reason: String,
}

/// JSON with `", "` and `": "` separators, the layout the host files have
/// always used.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

pub fn encode_arguments(arguments: &Arguments) -> String {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    if let Err(e) = arguments.serialize(&mut serializer) {
        tracing::error!("Failed to encode arguments {:?}: {}", arguments, e);
        return "{}".to_string();
    }
    String::from_utf8(buffer).unwrap_or_else(|_| "{}".to_string())
}

/// Encode a destination's associations as `service:{json};service:{json}`.
pub fn encode_associations(associations: &[Association]) -> String {
    associations
        .iter()
        .map(|a| format!("{}:{}", a.service, encode_arguments(&a.arguments)))
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode the output of [`encode_associations`]. A bare `service` token with
/// no `:` is the older format and carries no arguments.
pub fn decode_associations(encoded: &str) -> Result<Vec<Association>, DecodeError> {
    let mut associations = Vec::new();
    let mut rest = encoded;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let position = encoded.len() - rest.len();

        let name_end = rest.find(&[':', ';'][..]).unwrap_or(rest.len());
        let service = rest[..name_end].trim().to_string();
        rest = &rest[name_end..];

        let arguments = match rest.strip_prefix(':') {
            Some(json) => {
                let mut stream = serde_json::Deserializer::from_str(json).into_iter::<BTreeMap<String, Value>>();
                let parsed = match stream.next() {
                    Some(Ok(parsed)) => parsed,
                    Some(Err(e)) => {
                        return Err(DecodeError {
                            position,
                            reason: format!("arguments of '{}': {}", service, e),
                        })
                    }
                    None => {
                        return Err(DecodeError {
                            position,
                            reason: format!("arguments of '{}' are missing", service),
                        })
                    }
                };
                rest = &json[stream.byte_offset()..];
                parsed
                    .into_iter()
                    .map(|(key, value)| match value {
                        Value::String(text) => (key, text),
                        other => (key, other.to_string()),
                    })
                    .collect()
            }
            None => Arguments::new(),
        };

        rest = rest.trim_start();
        if let Some(next) = rest.strip_prefix(';') {
            rest = next;
        } else if !rest.is_empty() {
            return Err(DecodeError {
                position: encoded.len() - rest.len(),
                reason: "expected ';' between associations".to_string(),
            });
        }

        if service.is_empty() {
            return Err(DecodeError {
                position,
                reason: "empty service name".to_string(),
            });
        }
        associations.push(Association::new(service, arguments));
    }

    Ok(associations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn encodes_with_spaced_separators() {
        let associations = vec![Association::new("http", args(&[("path", "/index")]))];
        assert_eq!(encode_associations(&associations), "http:{\"path\": \"/index\"}");
    }

    #[test]
    fn empty_arguments_encode_as_braces() {
        let associations = vec![
            Association::new("ssh", Arguments::new()),
            Association::new("sftp", args(&[("port", "2222"), ("user", "root")])),
        ];
        let encoded = encode_associations(&associations);
        assert_eq!(encoded, "ssh:{};sftp:{\"port\": \"2222\", \"user\": \"root\"}");
        assert_eq!(decode_associations(&encoded).unwrap(), associations);
    }

    #[test]
    fn legacy_tokens_have_no_arguments() {
        let decoded = decode_associations("ssh;vnc").unwrap();
        assert_eq!(
            decoded,
            vec![
                Association::new("ssh", Arguments::new()),
                Association::new("vnc", Arguments::new()),
            ]
        );
    }

    #[test]
    fn semicolons_inside_arguments_do_not_split() {
        let associations = vec![
            Association::new("run", args(&[("script", "a; b")])),
            Association::new("ssh", Arguments::new()),
        ];
        let encoded = encode_associations(&associations);
        assert_eq!(decode_associations(&encoded).unwrap(), associations);
    }

    #[test]
    fn non_string_values_are_stringified() {
        let decoded = decode_associations("vnc:{\"display\": 1}").unwrap();
        assert_eq!(decoded[0].arguments["display"], "1");
    }

    #[test]
    fn broken_json_is_reported() {
        let err = decode_associations("ssh:{\"port\": ").unwrap_err();
        assert_eq!(err.position, 0);
        assert!(err.reason.contains("ssh"));
    }

    #[test]
    fn empty_string_has_no_associations() {
        assert!(decode_associations("").unwrap().is_empty());
    }
}
