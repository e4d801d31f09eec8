//! String-formatting capability.
//!
//! The template uses `{name}` placeholders; `{{` and `}}` are literal braces.

use async_trait::async_trait;
use serde_json::{Map, Value};

use llmc_core::api::{Capability, CapabilityError};

use super::value_text;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

#[derive(Debug, Clone)]
pub struct TemplateCapability {
    name: String,
    description: String,
    arguments: Vec<String>,
    segments: Vec<Segment>,
}

impl TemplateCapability {
    /// Compiles `template`. When `arguments` is empty the argument names are
    /// the placeholders in order of first appearance.
    pub fn new(
        name: impl Into<String>,
        template: &str,
        arguments: Vec<String>,
    ) -> Result<Self, CapabilityError> {
        let segments = compile(template)?;
        let arguments = if arguments.is_empty() {
            let mut names: Vec<String> = Vec::new();
            for segment in &segments {
                if let Segment::Field(field) = segment {
                    if !names.contains(field) {
                        names.push(field.clone());
                    }
                }
            }
            names
        } else {
            arguments
        };

        Ok(Self {
            name: name.into(),
            description: String::new(),
            arguments,
            segments,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn render(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value = args.get(field).ok_or_else(|| {
                        CapabilityError::InvalidArguments(format!("missing argument `{field}`"))
                    })?;
                    out.push_str(&value_text(value));
                }
            }
        }
        Ok(out)
    }
}

fn compile(template: &str) -> Result<Vec<Segment>, CapabilityError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) if c.is_alphanumeric() || c == '_' => field.push(c),
                        _ => {
                            return Err(CapabilityError::InvalidArguments(format!(
                                "malformed placeholder in template {template:?}"
                            )))
                        }
                    }
                }
                if field.is_empty() {
                    return Err(CapabilityError::InvalidArguments(format!(
                        "empty placeholder in template {template:?}"
                    )));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Field(field));
            }
            '}' => {
                return Err(CapabilityError::InvalidArguments(format!(
                    "unmatched `}}` in template {template:?}"
                )))
            }
            c => text.push(c),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

#[async_trait]
impl Capability for TemplateCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn argument_names(&self) -> &[String] {
        &self.arguments
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, CapabilityError> {
        self.render(args)
    }
}
