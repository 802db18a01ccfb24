//! Flushed, term-sorted partial index files and the line reader used to merge them.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::codec::{self, Record};
use crate::error::Result;

pub const SEGMENT_EXTENSION: &str = "tmp";
pub const POSTINGS_STEM: &str = "index";
pub const LINKS_STEM: &str = "link_index";
/// Stems of every segment family a build writes.
pub const SEGMENT_STEMS: [&str; 2] = [POSTINGS_STEM, LINKS_STEM];

/// Path of the `number`-th segment for the index file named `stem`.
pub fn segment_path(dir: &Path, stem: &str, number: usize) -> PathBuf {
    dir.join(format!("{stem}_{number}.{SEGMENT_EXTENSION}"))
}

/// Writer wrapper keeping track of the number of bytes written so far,
/// i.e. the offset the next record starts at.
pub struct CountingWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self { Self { inner, bytes_written: 0 } }

    pub fn position(&self) -> u64 { self.bytes_written }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

/// Serialize sorted `(key, record)` pairs into a new segment file.
/// Empty records are skipped. Returns the number of lines written.
pub fn write_segment<'a, R, I>(path: &Path, entries: I, buffer_bytes: usize) -> Result<usize>
where
    R: Record + 'a,
    I: IntoIterator<Item = (&'a String, &'a R)>,
{
    let mut out = BufWriter::with_capacity(buffer_bytes, File::create(path)?);
    let mut lines = 0;
    for (key, record) in entries {
        if record.is_empty() { continue; }
        codec::write_line(&mut out, key, record)?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}

/// One line of a segment: the decoded key and the still-undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub key: String,
    pub body: String,
}

/// Sequential reader over a segment file. Lines with an undecodable key are
/// logged and skipped.
pub struct SegmentReader<R: Record> {
    path: PathBuf,
    reader: BufReader<File>,
    line: String,
    _record: PhantomData<R>,
}

impl<R: Record> SegmentReader<R> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(File::open(path)?),
            line: String::new(),
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Next well-formed entry, or `None` at end of file.
    pub fn next_entry(&mut self) -> Result<Option<SegmentEntry>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            if self.line.trim().is_empty() { continue; }
            let decoded = codec::split_line(&self.line)
                .and_then(|(raw_key, body)| Ok((codec::decode_key::<R>(raw_key)?, body)));
            match decoded {
                Ok((key, body)) => {
                    return Ok(Some(SegmentEntry { key, body: body.to_string() }));
                }
                Err(err) => {
                    tracing::warn!(segment = %self.path.display(), error = %err, "skipping malformed segment line");
                }
            }
        }
    }
}
