//! `{name}` placeholder templates for narration text and upload titles.

use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown placeholder {{{name}}} (expected one of: {expected})")]
pub struct TemplateError {
    pub name: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Var(String),
}

/// A parsed template.
///
/// Text between `{` and the next `}` names a variable when it is a plain
/// identifier; anything else (including an unmatched brace) is literal.
///
/// ```
/// use reelforged::template::Template;
///
/// let template = Template::parse("Hello {topic}!");
/// let text = template.render(&[("topic", "Leo")].into_iter().collect());
/// assert_eq!(text, "Hello Leo!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find('}') {
                Some(close) if is_identifier(&after[..close]) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Var(after[..close].to_string()));
                    rest = &after[close + 1..];
                }
                _ => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Self { pieces }
    }

    /// Names of all placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Var(name) => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Fail on the first placeholder not listed in `allowed`.
    pub fn check_placeholders(&self, allowed: &[&str]) -> Result<(), TemplateError> {
        match self.placeholders().find(|name| !allowed.contains(name)) {
            Some(name) => Err(TemplateError {
                name: name.to_string(),
                expected: allowed.join(", "),
            }),
            None => Ok(()),
        }
    }

    /// True when rendering could only ever produce whitespace.
    pub fn is_blank(&self) -> bool {
        self.pieces.iter().all(|p| match p {
            Piece::Literal(text) => text.trim().is_empty(),
            Piece::Var(_) => false,
        })
    }

    /// Substitute variables; unknown placeholders are left as written.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Var(name) => match vars.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
