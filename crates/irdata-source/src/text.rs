//! Delimited text decoding.
//!
//! Pipeline:
//!   raw bytes
//!     └─ TextEncoding::decode()  → str
//!          └─ records()         → Vec<(line, Vec<String>)>
//!               └─ header names → Vec<Row>

use std::borrow::Cow;

use irdata_core::row::Row;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Encoding ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
  #[default]
  Utf8,
  /// ISO-8859-1, decoded as its windows-1252 superset.
  Latin1,
}

impl TextEncoding {
  pub fn decode<'a>(self, what: &str, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    match self {
      Self::Utf8 => {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        encoding_rs::UTF_8
          .decode_without_bom_handling_and_without_replacement(bytes)
          .ok_or_else(|| Error::decode(what, "invalid UTF-8"))
      }
      Self::Latin1 => Ok(encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0),
    }
  }
}

// ─── Field names ─────────────────────────────────────────────────────────────

/// `WarNum` → `war_num`, `CCode` → `ccode`, `StartYear1` → `start_year1`.
///
/// An underscore goes before each uppercase letter that follows a lowercase
/// one; the result is lowercased.
pub fn camel_to_snake(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  let mut prev_lower = false;
  for c in name.trim().chars() {
    if c.is_ascii_uppercase() && prev_lower {
      out.push('_');
    }
    prev_lower = c.is_ascii_lowercase();
    out.push(c.to_ascii_lowercase());
  }
  out
}

// ─── Delimited ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
  /// The first record holds the field names.
  FirstRow,
  /// The file has no header; use these names.
  Names(Vec<String>),
}

/// A delimited-text dialect: delimiter, header handling and encoding.
///
/// Fields may be double-quoted; a doubled quote inside a quoted field stands
/// for one quote, and quoted fields may span lines. Blank lines are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimited {
  pub delimiter: char,
  pub header:    Header,
  pub encoding:  TextEncoding,
}

impl Delimited {
  /// Comma-separated with a header row, UTF-8.
  pub fn csv() -> Self {
    Self { delimiter: ',', header: Header::FirstRow, encoding: TextEncoding::Utf8 }
  }

  /// Tab-separated without a header.
  pub fn tsv(names: &[&str]) -> Self {
    Self {
      delimiter: '\t',
      header:    Header::Names(names.iter().map(|n| (*n).to_owned()).collect()),
      encoding:  TextEncoding::Utf8,
    }
  }

  pub fn encoding(mut self, encoding: TextEncoding) -> Self {
    self.encoding = encoding;
    self
  }

  /// Decode `bytes` into rows. Header names are normalised with
  /// [`camel_to_snake`]. A short record yields a row without its trailing
  /// fields; extra fields are dropped.
  pub fn rows(&self, what: &str, bytes: &[u8]) -> Result<Vec<Row>> {
    let text = self.encoding.decode(what, bytes)?;
    let mut records = records(what, &text, self.delimiter)?.into_iter();

    let names: Vec<String> = match &self.header {
      Header::Names(names) => names.iter().map(|n| camel_to_snake(n)).collect(),
      Header::FirstRow => match records.next() {
        Some((_, fields)) => fields.iter().map(|n| camel_to_snake(n)).collect(),
        None => return Ok(Vec::new()),
      },
    };

    Ok(
      records
        .map(|(line, fields)| Row::new(line, names.iter().cloned().zip(fields).collect()))
        .collect(),
    )
  }
}

/// Split `text` into records of fields, each tagged with the 1-based line on
/// which it starts.
fn records(what: &str, text: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>> {
  let mut out = Vec::new();
  let mut fields: Vec<String> = Vec::new();
  let mut field = String::new();
  let mut line = 1;
  let mut start_line = 1;
  let mut in_quotes = false;
  let mut quoted = false;
  let mut chars = text.chars().peekable();

  let mut end_record = |fields: &mut Vec<String>, field: &mut String, start_line: usize| {
    fields.push(std::mem::take(field));
    let record = std::mem::take(fields);
    if !(record.len() == 1 && record[0].trim().is_empty()) {
      out.push((start_line, record));
    }
  };

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push('\n');
        }
        _ => field.push(c),
      }
      continue;
    }
    match c {
      '"' if field.is_empty() && !quoted => {
        in_quotes = true;
        quoted = true;
      }
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' => {
        end_record(&mut fields, &mut field, start_line);
        quoted = false;
        line += 1;
        start_line = line;
      }
      c if c == delimiter => {
        fields.push(std::mem::take(&mut field));
        quoted = false;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::decode(what, format!("unterminated quote in record starting on line {start_line}")));
  }
  if !field.is_empty() || !fields.is_empty() {
    end_record(&mut fields, &mut field, start_line);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn camel_case_headers() {
    assert_eq!(camel_to_snake("WarNum"), "war_num");
    assert_eq!(camel_to_snake("CCode"), "ccode");
    assert_eq!(camel_to_snake("StartYear1"), "start_year1");
    assert_eq!(camel_to_snake("state_nme"), "state_nme");
    assert_eq!(camel_to_snake(" BatDeath "), "bat_death");
  }

  #[test]
  fn csv_with_header_and_quotes() {
    let input = b"WarNum,WarName,BatDeath\r\n1,\"Franco-Spanish War\",\"1,000\"\r\n\r\n4,\"War of the \"\"Roman\"\" Republic\",-9\r\n";
    let rows = Delimited::csv().rows("wars", input).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[0].get("war_name"), Some("Franco-Spanish War"));
    assert_eq!(rows[0].get("bat_death"), Some("1,000"));
    assert_eq!(rows[1].line, 4);
    assert_eq!(rows[1].get("war_name"), Some("War of the \"Roman\" Republic"));
  }

  #[test]
  fn quoted_field_spanning_lines_keeps_start_line() {
    let input = b"a,b\n\"x\ny\",2\n3,4";
    let rows = Delimited::csv().rows("t", input).unwrap();
    assert_eq!(rows[0].get("a"), Some("x\ny"));
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[1].line, 4);
    assert_eq!(rows[1].get("b"), Some("4"));
  }

  #[test]
  fn unterminated_quote_is_an_error() {
    let err = Delimited::csv().rows("t", b"a\n\"open").unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
  }

  #[test]
  fn headerless_latin1_tsv() {
    let input = b"390\tDEN\tDenmark\t01:01:1816\t01:11:2008\n230\tSPN\tSpain\t01:01:1816\t01:11:2008\n95\tPAN\tPanam\xe1\t03:11:1903\t01:11:2008\n";
    let rows = Delimited::tsv(&["idnum", "idabb", "country_name", "start_date", "end_date"])
      .encoding(TextEncoding::Latin1)
      .rows("iisystem", input)
      .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].line, 1);
    assert_eq!(rows[2].get("country_name"), Some("Panamá"));
  }

  #[test]
  fn short_records_lack_trailing_fields() {
    let rows = Delimited::csv().rows("t", b"a,b,c\n1,2\n").unwrap();
    assert_eq!(rows[0].get("b"), Some("2"));
    assert_eq!(rows[0].get("c"), None);
  }

  #[test]
  fn invalid_utf8_is_rejected() {
    assert!(Delimited::csv().rows("t", b"a\n\xff\n").is_err());
  }
}
