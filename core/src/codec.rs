//! Line-oriented text encoding shared by segments and the final index files.
//!
//! Every record is one line, `<key>:<body>.` followed by a newline.
//! Postings bodies look like `doc:pos,pos;doc:pos`; link bodies are a comma
//! separated list of titles. Term keys are base64 encoded so that they can
//! never collide with the delimiters; normalized titles are stored as is.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::borrow::Cow;
use std::io::{self, Write};

use crate::error::EncodingError;
use crate::index::{DocId, Position, PostingsList};
use crate::links::TitleList;

pub const KEY_SEPARATOR: char = ':';
pub const RECORD_TERMINATOR: u8 = b'.';

/// A list type that can be stored as the body of a line.
pub trait Record: Default {
    /// Whether keys of this record type are base64 encoded on disk.
    const BASE64_KEYS: bool;

    fn write_body<W: Write>(&self, out: &mut W) -> io::Result<()>;

    /// Lenient decoding: malformed tokens are pushed to `errors` and skipped.
    fn decode_body(key: &str, body: &str, errors: &mut Vec<EncodingError>) -> Self;

    fn union(&mut self, other: Self);

    fn is_empty(&self) -> bool;
}

impl Record for PostingsList {
    const BASE64_KEYS: bool = true;

    fn write_body<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, (doc_id, positions)) in self.iter().enumerate() {
            if i > 0 { out.write_all(b";")?; }
            write!(out, "{doc_id}:")?;
            for (j, position) in positions.iter().enumerate() {
                if j > 0 { out.write_all(b",")?; }
                write!(out, "{position}")?;
            }
        }
        Ok(())
    }

    fn decode_body(_key: &str, body: &str, errors: &mut Vec<EncodingError>) -> Self {
        let mut list = PostingsList::new();
        let body = body.trim().trim_end_matches('.');
        for entry in body.split(';').filter(|e| !e.is_empty()) {
            let Some((doc, positions)) = entry.split_once(':') else {
                errors.push(EncodingError::InvalidDocId(entry.to_string()));
                continue;
            };
            let doc_id: DocId = match doc.trim().parse() {
                Ok(id) => id,
                Err(_) => {
                    errors.push(EncodingError::InvalidDocId(doc.to_string()));
                    continue;
                }
            };
            for token in positions.split(',').filter(|t| !t.is_empty()) {
                match token.trim().parse::<Position>() {
                    Ok(position) => list.add_occurrence(doc_id, position),
                    Err(_) => errors.push(EncodingError::InvalidPosition(token.to_string())),
                }
            }
        }
        list
    }

    fn union(&mut self, other: Self) { PostingsList::union(self, other) }

    fn is_empty(&self) -> bool { PostingsList::is_empty(self) }
}

impl Record for TitleList {
    const BASE64_KEYS: bool = false;

    fn write_body<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, title) in self.titles().enumerate() {
            if i > 0 { out.write_all(b",")?; }
            out.write_all(title.as_bytes())?;
        }
        Ok(())
    }

    fn decode_body(key: &str, body: &str, _errors: &mut Vec<EncodingError>) -> Self {
        let mut list = TitleList::new(key);
        let body = body.trim().trim_end_matches('.');
        for title in body.split(',').filter(|t| !t.is_empty()) {
            list.add_title(title);
        }
        list
    }

    fn union(&mut self, other: Self) { TitleList::union(self, other) }

    fn is_empty(&self) -> bool { TitleList::is_empty(self) }
}

pub fn encode_key<R: Record>(key: &str) -> Cow<'_, str> {
    if R::BASE64_KEYS {
        Cow::Owned(STANDARD.encode(key.as_bytes()))
    } else {
        Cow::Borrowed(key)
    }
}

pub fn decode_key<R: Record>(raw: &str) -> Result<String, EncodingError> {
    if !R::BASE64_KEYS {
        return Ok(raw.to_string());
    }
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|_| EncodingError::InvalidBase64(raw.to_string()))?;
    String::from_utf8(bytes).map_err(|_| EncodingError::InvalidUtf8)
}

/// Write one complete record line.
pub fn write_line<R: Record, W: Write>(out: &mut W, key: &str, record: &R) -> io::Result<()> {
    out.write_all(encode_key::<R>(key).as_bytes())?;
    out.write_all(&[KEY_SEPARATOR as u8])?;
    record.write_body(out)?;
    out.write_all(&[RECORD_TERMINATOR, b'\n'])
}

/// Split a raw line into its still-encoded key and its body (without terminator).
pub fn split_line(line: &str) -> Result<(&str, &str), EncodingError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let line = line.strip_suffix('.').unwrap_or(line);
    line.split_once(KEY_SEPARATOR).ok_or(EncodingError::MissingKeySeparator)
}

/// Decode a full line into its key and record, collecting body errors.
pub fn decode_line<R: Record>(
    line: &str,
    errors: &mut Vec<EncodingError>,
) -> Result<(String, R), EncodingError> {
    let (raw_key, body) = split_line(line)?;
    let key = decode_key::<R>(raw_key)?;
    let record = R::decode_body(&key, body, errors);
    Ok((key, record))
}

impl PostingsList {
    /// Body encoding, e.g. `1:1,2,3;6:1,3,8`.
    pub fn to_encoded_string(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_body(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Parse a body produced by [`PostingsList::to_encoded_string`], skipping
    /// malformed tokens and returning them alongside the list.
    pub fn parse(input: &str) -> (PostingsList, Vec<EncodingError>) {
        let mut errors = Vec::new();
        let list = <PostingsList as Record>::decode_body("", input, &mut errors);
        (list, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PostingsList {
        let mut list = PostingsList::new();
        list.add_occurrence(6, 8);
        list.add_occurrence(1, 3);
        list.add_occurrence(6, 1);
        list.add_occurrence(1, 1);
        list
    }

    #[test]
    fn encodes_canonically() {
        assert_eq!(sample().to_encoded_string(), "1:1,3;6:1,8");
        let mut buf = Vec::new();
        sample().write_body(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1:1,3;6:1,8");
    }

    #[test]
    fn lenient_parse_skips_bad_tokens() {
        let (list, errors) = PostingsList::parse("1:1,x,3;zz:4;6:1,8.");
        assert_eq!(list.to_encoded_string(), "1:1,3;6:1,8");
        assert_eq!(
            errors,
            vec![
                EncodingError::InvalidPosition("x".into()),
                EncodingError::InvalidDocId("zz".into()),
            ]
        );
    }

    #[test]
    fn document_without_valid_positions_is_dropped() {
        let (list, errors) = PostingsList::parse("4:a,b");
        assert!(list.is_empty());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn term_keys_are_base64() {
        let mut buf = Vec::new();
        write_line(&mut buf, "a:b.c", &sample()).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.starts_with("YTpiLmM=:"));
        assert!(line.ends_with(".\n"));

        let mut errors = Vec::new();
        let (key, list) = decode_line::<PostingsList>(&line, &mut errors).unwrap();
        assert_eq!(key, "a:b.c");
        assert_eq!(list, sample());
        assert!(errors.is_empty());
    }

    #[test]
    fn title_lines_keep_plain_keys() {
        let mut list = TitleList::new("apple");
        list.add_title("orchard");
        list.add_title("fruitsalad");
        let mut buf = Vec::new();
        write_line(&mut buf, "apple", &list).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "apple:fruitsalad,orchard.\n");
    }

    #[test]
    fn bad_base64_key_is_reported() {
        let mut errors = Vec::new();
        let err = decode_line::<PostingsList>("!!!:1:2.\n", &mut errors).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidBase64(_)));
        let err = decode_line::<PostingsList>("no separator here.\n", &mut errors).unwrap_err();
        assert_eq!(err, EncodingError::MissingKeySeparator);
    }
}
