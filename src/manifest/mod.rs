//! The manifest is the hand-off artifact between pipeline stages: one
//! `bucket,key` record per line, no header row.
//!
//! Fields that contain a delimiter, a quote or a line break are written
//! double-quoted with inner quotes doubled, which is what the batch service's
//! CSV reader expects. Everything else is written verbatim.

#[cfg(test)]
mod tests;

use std::{fmt, mem, path::Path};

use tokio::fs;

use crate::error::{Error, Result};

const DELIMITER: char = ',';
const QUOTE: char = '"';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifestEntry {
    pub bucket: String,
    pub key: String,
}

impl ManifestEntry {
    pub fn new<B: Into<String>, K: Into<String>>(bucket: B, key: K) -> Self {
        ManifestEntry {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Zero-byte placeholder objects that console uploads create for folders.
    pub fn is_directory(&self) -> bool {
        self.key.ends_with('/')
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

pub fn encode(entries: &[ManifestEntry]) -> String {
    let mut text = String::new();
    for entry in entries {
        encode_field(&mut text, &entry.bucket);
        text.push(DELIMITER);
        encode_field(&mut text, &entry.key);
        text.push('\n');
    }

    text
}

fn encode_field(text: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');

    if needs_quotes {
        text.push(QUOTE);
        for c in field.chars() {
            if c == QUOTE {
                text.push(QUOTE);
            }
            text.push(c);
        }
        text.push(QUOTE);
    } else {
        text.push_str(field);
    }
}

pub fn decode(text: &str) -> Result<Vec<ManifestEntry>> {
    let mut decoder = Decoder::default();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if decoder.in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    decoder.field.push(QUOTE);
                }
                QUOTE => decoder.in_quotes = false,
                c => {
                    if c == '\n' {
                        decoder.line += 1;
                    }
                    decoder.field.push(c);
                }
            }
        } else {
            match c {
                QUOTE if decoder.field.is_empty() => decoder.in_quotes = true,
                DELIMITER => decoder.end_field(),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    decoder.end_record()?;
                    decoder.line += 1;
                    decoder.record_line = decoder.line;
                }
                c => decoder.field.push(c),
            }
        }
    }

    if decoder.in_quotes {
        return Err(decoder.invalid_record());
    }

    decoder.end_record()?;
    Ok(decoder.entries)
}

#[derive(Debug)]
struct Decoder {
    entries: Vec<ManifestEntry>,
    fields: Vec<String>,
    field: String,
    in_quotes: bool,
    line: usize,
    record_line: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder {
            entries: vec![],
            fields: vec![],
            field: String::new(),
            in_quotes: false,
            line: 1,
            record_line: 1,
        }
    }
}

impl Decoder {
    fn end_field(&mut self) {
        let field = mem::take(&mut self.field);
        self.fields.push(field);
    }

    fn end_record(&mut self) -> Result<()> {
        self.end_field();
        let fields = mem::take(&mut self.fields);

        match <[String; 2]>::try_from(fields) {
            Ok([bucket, key]) if !bucket.is_empty() && !key.is_empty() => {
                self.entries.push(ManifestEntry { bucket, key });
                Ok(())
            }
            Ok(fields) => Err(self.invalid_fields(&fields)),
            Err(fields) if fields.len() == 1 && fields[0].is_empty() => Ok(()),
            Err(fields) => Err(self.invalid_fields(&fields)),
        }
    }

    fn invalid_fields(&self, fields: &[String]) -> Error {
        Error::InvalidManifestRecord {
            line: self.record_line,
            record: fields.join(","),
        }
    }

    fn invalid_record(&self) -> Error {
        let mut fields = self.fields.clone();
        fields.push(self.field.clone());
        self.invalid_fields(&fields)
    }
}

pub async fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }

    let text = encode(entries);
    fs::write(path, text).await?;
    Ok(())
}

pub async fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }

    let text = fs::read_to_string(path).await?;
    decode(&text)
}
