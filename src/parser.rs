//! Hidden form field extraction for portal HTML pages.

use regex::Regex;

use crate::error::PortalError;

/// Pulls the `value` of a named `<input>` out of an HTML document.
pub trait TokenExtractor: Send + Sync {
    /// Returns the value of the first `<input name="{field}">` in `html`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::TokenExtraction`] if no such input exists or it
    /// has no `value` attribute.
    fn extract(&self, html: &str, field: &str) -> Result<String, PortalError>;
}

/// [`TokenExtractor`] that scans `<input>` tags and their attributes.
///
/// Attribute order and quoting style are irrelevant; `name` is matched
/// exactly, attribute names case-insensitively.
pub struct FormFieldExtractor {
    input_tag: Regex,
    attribute: Regex,
}

impl FormFieldExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            input_tag: Regex::new(r"(?is)<input\b([^>]*)>")?,
            attribute: Regex::new(
                r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#,
            )?,
        })
    }

    fn attributes<'h>(&self, tag: &'h str) -> impl Iterator<Item = (String, &'h str)> {
        self.attribute.captures_iter(tag).filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or(caps.get(3)).or(caps.get(4))?.as_str();
            Some((name, value))
        })
    }
}

impl TokenExtractor for FormFieldExtractor {
    fn extract(&self, html: &str, field: &str) -> Result<String, PortalError> {
        for tag in self.input_tag.captures_iter(html) {
            let Some(attrs) = tag.get(1) else { continue };

            let mut name = None;
            let mut value = None;
            for (attr, val) in self.attributes(attrs.as_str()) {
                match attr.as_str() {
                    "name" => name = Some(val),
                    "value" => value = Some(val),
                    _ => {}
                }
            }

            if name == Some(field) {
                if let Some(value) = value {
                    return Ok(value.to_string());
                }
            }
        }

        Err(PortalError::TokenExtraction {
            field: field.to_string(),
        })
    }
}
