//! `DescFile`: the line-oriented text format every ASTRE text artifact
//! (points files, trajectory files) is built on (spec §6.1).
//!
//! Ported from `pymage.format.descfile.DescFile`.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{CliError, Result};

/// A parsed `DescFile`: an ordered header block, a fixed-width data
/// block, and the per-column tag each column's first tagged entry fixed.
#[derive(Debug, Clone, Default)]
pub struct DescFile {
    headers: Vec<(String, String)>,
    tags: Vec<Option<String>>,
    data: Vec<Vec<f64>>,
}

impl DescFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    /// Parses the `KEY = VALUE` header block followed by `DATA` and a
    /// whitespace-separated data block, per spec §6.1.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Vec::new();
        let mut tags: Vec<Option<String>> = Vec::new();
        let mut data = Vec::new();
        let mut in_data = false;
        let mut n_entries: Option<usize> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !in_data && line == "DATA" {
                in_data = true;
                continue;
            }
            if !in_data {
                let (key, value) = line
                    .split_once('=')
                    .ok_or_else(|| CliError::Parse(format!("header line is not `KEY = VALUE`: {:?}", line)))?;
                headers.push((key.trim().to_string(), value.trim().to_string()));
                continue;
            }

            let entries: Vec<&str> = line.split_whitespace().collect();
            match n_entries {
                None => {
                    n_entries = Some(entries.len());
                    tags = vec![None; entries.len()];
                }
                Some(n) if n != entries.len() => {
                    return Err(CliError::Parse(format!(
                        "invalid number of entries ({} instead of {}) in line: {:?}",
                        entries.len(),
                        n,
                        line
                    )));
                }
                _ => {}
            }

            let mut row = Vec::with_capacity(entries.len());
            for (col, entry) in entries.iter().enumerate() {
                let (tag, value_str) = match entry.split_once(':') {
                    Some((t, v)) => (Some(t), v),
                    None => (None, *entry),
                };
                let value: f64 = value_str
                    .parse()
                    .map_err(|_| CliError::Parse(format!("not a number: {:?}", entry)))?;
                if let Some(tag) = tag {
                    match &tags[col] {
                        Some(existing) if existing != tag => {
                            return Err(CliError::Parse(format!(
                                "column {} tag is `{}`, conflicts with previously observed `{}`",
                                col, tag, existing
                            )));
                        }
                        Some(_) => {}
                        None => tags[col] = Some(tag.to_string()),
                    }
                }
                row.push(value);
            }
            data.push(row);
        }

        Ok(Self { headers, tags, data })
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.headers.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.headers.push((key.to_string(), value));
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn tags(&self) -> &[Option<String>] {
        &self.tags
    }

    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn set_tags(&mut self, tags: Vec<Option<String>>) {
        self.tags = tags;
    }

    pub fn set_data(&mut self, data: Vec<Vec<f64>>) {
        self.data = data;
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|source| CliError::Write { path: path.to_path_buf(), source })
    }
}

impl fmt::Display for DescFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.headers {
            writeln!(f, "{} = {}", k, v)?;
        }
        writeln!(f, "DATA")?;
        for row in &self.data {
            for (i, value) in row.iter().enumerate() {
                match self.tags.get(i).and_then(|t| t.as_ref()) {
                    Some(tag) => write!(f, "{}:{} ", tag, format_g(*value))?,
                    None => write!(f, "{} ", format_g(*value))?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// `%g`-equivalent formatting: the shortest decimal representation that
/// round-trips, matching the original's `"{0:g}".format(value)`.
fn format_g(v: f64) -> String {
    format!("{}", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_headers_and_tagged_data() {
        let text = "type = \"PointsFile v.1.0\"\nwidth = 100\nDATA\nf:0 x:10.5 y:20\nf:1 x:11 y:21\n";
        let df = DescFile::parse(text).unwrap();
        assert_eq!(df.header("width"), Some("100"));
        assert_eq!(df.data().len(), 2);
        assert_eq!(df.tags(), &[Some("f".to_string()), Some("x".to_string()), Some("y".to_string())]);

        let rendered = df.to_string();
        let reparsed = DescFile::parse(&rendered).unwrap();
        assert_eq!(reparsed.data(), df.data());
        assert_eq!(reparsed.tags(), df.tags());
    }

    #[test]
    fn ignores_blank_lines_and_comments() {
        let text = "# a comment\n\nwidth = 5\n\nDATA\n# another comment\n0 1 2\n";
        let df = DescFile::parse(text).unwrap();
        assert_eq!(df.header("width"), Some("5"));
        assert_eq!(df.data(), &[vec![0.0, 1.0, 2.0]]);
    }

    #[test]
    fn conflicting_tag_is_an_error() {
        let text = "DATA\nf:0 x:1\nq:1 x:2\n";
        let err = DescFile::parse(text).unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }

    #[test]
    fn mismatched_row_width_is_an_error() {
        let text = "DATA\n0 1 2\n0 1\n";
        let err = DescFile::parse(text).unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }
}
