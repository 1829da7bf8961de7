use crate::error::TemplateError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// A command line with `{field}` placeholders. `{{` and `}}` stand for
/// literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::Malformed { position }),
                            c => field.push(c),
                        }
                    }
                    let field = field.trim().to_string();
                    if !closed || field.is_empty() {
                        return Err(TemplateError::Malformed { position });
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(TemplateError::Malformed { position }),
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self { segments })
    }

    /// Distinct field names in order of first use.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field(name) = segment {
                if !fields.contains(name) {
                    fields.push(name.clone());
                }
            }
        }
        fields
    }

    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingField { field: name.clone() })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render in one go.
pub fn expand(source: &str, values: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    Template::parse(source)?.render(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_address() {
        let command = expand("ssh {address}", &values(&[("address", "10.0.0.5")])).unwrap();
        assert_eq!(command, "ssh 10.0.0.5");
    }

    #[test]
    fn reports_the_missing_field() {
        let err = expand("ssh -p {port} {address}", &values(&[("address", "10.0.0.5")])).unwrap_err();
        assert_eq!(err, TemplateError::MissingField { field: "port".into() });
    }

    #[test]
    fn doubled_braces_are_literal() {
        let command = expand("awk '{{print $1}}' {address}", &values(&[("address", "f")])).unwrap();
        assert_eq!(command, "awk '{print $1}' f");
    }

    #[test]
    fn unbalanced_braces_are_malformed() {
        assert_eq!(
            Template::parse("ssh {address").unwrap_err(),
            TemplateError::Malformed { position: 4 }
        );
        assert_eq!(
            Template::parse("ssh address}").unwrap_err(),
            TemplateError::Malformed { position: 11 }
        );
        assert!(Template::parse("ssh {}").is_err());
    }

    #[test]
    fn lists_distinct_fields() {
        let template = Template::parse("{user}@{address} -p {port} {user}").unwrap();
        assert_eq!(template.fields(), vec!["user", "address", "port"]);
    }
}
