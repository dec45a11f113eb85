// src/paragraph.rs

//! Control-format paragraph parser
//!
//! Port CONTROL files, cached binary CONTROL files and the installed-status
//! database all share one line-oriented format: paragraphs of `Key: value`
//! fields separated by blank lines, with continuation lines indented by a
//! space or tab. Lines starting with `#` are comments.

use crate::error::{Error, Result};

/// One parsed paragraph: an ordered list of `(key, value)` fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    fields: Vec<(String, String)>,
}

impl Paragraph {
    /// Value of the first field with the given key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a required field
    pub fn require(&self, key: &str, line: usize) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::Parse {
            line,
            message: format!("missing required field '{key}'"),
        })
    }

    /// True if the paragraph has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(&mut self, key: String, value: String) {
        self.fields.push((key, value));
    }
}

/// Split text into paragraphs of `Key: value` fields
///
/// Returns paragraphs paired with the line number they start on, for
/// diagnostics further up the stack.
pub fn parse_paragraphs(text: &str) -> Result<Vec<(Paragraph, usize)>> {
    let mut paragraphs = Vec::new();
    let mut current = Paragraph::default();
    let mut start_line = 0usize;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();

        if line.starts_with('#') {
            continue;
        }

        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push((std::mem::take(&mut current), start_line));
            }
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation of the previous field
            match current.fields.last_mut() {
                Some((_, value)) => {
                    value.push('\n');
                    value.push_str(line.trim_start());
                }
                None => {
                    return Err(Error::Parse {
                        line: line_no,
                        message: "continuation line with no preceding field".to_string(),
                    });
                }
            }
            continue;
        }

        let colon = line.find(':').ok_or_else(|| Error::Parse {
            line: line_no,
            message: format!("expected 'Key: value', found '{line}'"),
        })?;
        let key = line[..colon].trim();
        if key.is_empty() {
            return Err(Error::Parse {
                line: line_no,
                message: "empty field name".to_string(),
            });
        }

        if current.is_empty() {
            start_line = line_no;
        }
        current.push(key.to_string(), line[colon + 1..].trim().to_string());
    }

    if !current.is_empty() {
        paragraphs.push((current, start_line));
    }

    Ok(paragraphs)
}

/// Split a comma-separated field value into trimmed, non-empty entries
pub fn parse_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
