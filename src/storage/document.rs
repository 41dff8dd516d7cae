//! The plain-text content format records are stored in.
//!
//! One `Key: value` field per block, blocks separated by a line holding only `----`.

pub const FIELD_SEPARATOR: &str = "----";

/// Ordered list of fields. Order is preserved both ways.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, String)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// value of the first field with this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Values are written on a single line, so no value can open a block of its own
    pub fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| {
                let value = single_line(value);
                if value.is_empty() {
                    format!("{key}:\n")
                } else {
                    format!("{key}: {value}\n")
                }
            })
            .collect::<Vec<_>>()
            .join(&format!("{FIELD_SEPARATOR}\n"))
    }

    /// Lenient parse: blocks without a `:` are dropped, values may span lines
    pub fn parse(text: &str) -> Self {
        let mut fields = Vec::new();
        let mut block = Vec::new();

        let mut flush = |block: &mut Vec<&str>| {
            let joined = block.join("\n");
            if let Some((key, value)) = joined.split_once(':') {
                let key = key.trim();
                if !key.is_empty() {
                    fields.push((key.to_string(), value.trim().to_string()));
                }
            }
            block.clear();
        };

        for line in text.lines() {
            if line.trim() == FIELD_SEPARATOR {
                flush(&mut block);
            } else {
                block.push(line);
            }
        }
        flush(&mut block);

        Self { fields }
    }
}

/// Joins the non-blank lines of `value` with single spaces
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
