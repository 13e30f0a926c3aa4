//! Log Reader
//!
//! Walks the frames of a log file.

use std::fs;
use std::path::Path;

use crate::error::{Result, StashError};

use super::entry::{header_mismatch, FrameHeader, HeaderParse};
use super::{LogEntry, HEADER_SIZE};

/// One step of a walk over the log
#[derive(Debug)]
pub enum Frame {
    /// A complete, valid entry
    Entry(LogEntry),

    /// A damaged region, skipped up to the next valid frame
    Corrupted { offset: u64, reason: String },

    /// The file ends in the middle of a frame, or in damage that no valid
    /// frame follows
    Torn { offset: u64 },
}

/// Reads entries from a log file
///
/// The whole file is loaded on open; logs are only read at startup.
pub struct LogReader {
    data: Vec<u8>,
    position: usize,
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    /// Read frames from an in-memory buffer
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Read the next frame, or `None` at a clean end of file
    ///
    /// A torn frame ends the walk: the following call returns `None`.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return None;
        }

        let offset = self.position as u64;
        let header = match FrameHeader::parse(remaining) {
            HeaderParse::Valid(header) => header,
            HeaderParse::Short => {
                self.position = self.data.len();
                return Some(Frame::Torn { offset });
            }
            HeaderParse::Damaged { expected, actual } => {
                // The length can't be trusted, so the frame boundary is
                // unknown: resume at the next offset holding a whole frame.
                return Some(match self.find_valid_frame(self.position + 1) {
                    Some(next) => {
                        self.position = next;
                        Frame::Corrupted {
                            offset,
                            reason: format!(
                                "{}; skipped {} bytes",
                                header_mismatch(expected, actual),
                                next as u64 - offset
                            ),
                        }
                    }
                    None => {
                        self.position = self.data.len();
                        Frame::Torn { offset }
                    }
                });
            }
        };

        let total_len = HEADER_SIZE + header.len;
        let Some(data) = remaining.get(HEADER_SIZE..total_len) else {
            self.position = self.data.len();
            return Some(Frame::Torn { offset });
        };

        self.position += total_len;
        match LogEntry::from_frame(header, data) {
            Ok(entry) => Some(Frame::Entry(entry)),
            Err(e) => Some(Frame::Corrupted {
                offset,
                reason: e.to_string(),
            }),
        }
    }

    fn find_valid_frame(&self, from: usize) -> Option<usize> {
        (from..self.data.len()).find(|&pos| LogEntry::deserialize(&self.data[pos..]).is_ok())
    }

    /// Read the next entry, failing on any damaged frame
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        match self.next_frame() {
            None => Ok(None),
            Some(Frame::Entry(entry)) => Ok(Some(entry)),
            Some(Frame::Corrupted { offset, reason }) => Err(StashError::LogCorruption(
                format!("at offset {}: {}", offset, reason),
            )),
            Some(Frame::Torn { offset }) => Err(StashError::LogCorruption(format!(
                "partial entry at offset {}",
                offset
            ))),
        }
    }

    /// Iterate over all entries, stopping after the first error
    pub fn entries(self) -> LogIterator {
        LogIterator {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over log entries
pub struct LogIterator {
    reader: LogReader,
    failed: bool,
}

impl Iterator for LogIterator {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_entry() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
