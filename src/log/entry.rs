//! Log entry definitions
//!
//! Defines the structure and framing of individual log entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

/// Frame header size: LSN (8) + length (4) + header CRC (4) + data CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Bytes covered by the header CRC: LSN + length
const HEADER_CHECKED: usize = 12;

/// A single entry in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The mutation this entry records
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Mutations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or overwrite a key
    Set { key: String, value: Vec<u8> },

    /// Delete a key
    Delete { key: String },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &str {
        match self {
            Operation::Set { key, .. } | Operation::Delete { key } => key,
        }
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub len: usize,
    pub crc: u32,
}

/// Outcome of reading a header from the front of a buffer
#[derive(Debug)]
pub(crate) enum HeaderParse {
    /// Fewer than `HEADER_SIZE` bytes available
    Short,

    /// The LSN or length field does not match the header CRC
    Damaged { expected: u32, actual: u32 },

    Valid(FrameHeader),
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8]) -> HeaderParse {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return HeaderParse::Short;
        };

        let expected = read_u32(&header[12..16]);
        let actual = LogEntry::compute_crc(&header[..HEADER_CHECKED]);
        if expected != actual {
            return HeaderParse::Damaged { expected, actual };
        }

        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&header[0..8]);

        HeaderParse::Valid(Self {
            lsn: u64::from_be_bytes(lsn),
            len: read_u32(&header[8..12]) as usize,
            crc: read_u32(&header[16..20]),
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Serialize to a full frame: header + data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(&(&self.operation, self.timestamp)).map_err(|e| {
            StashError::Storage(format!("Failed to serialize log entry {}: {}", self.lsn, e))
        })?;

        let len = u32::try_from(data.len()).map_err(|_| {
            StashError::Storage(format!("Log entry {} too large: {} bytes", self.lsn, data.len()))
        })?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&self.lsn.to_be_bytes());
        frame.extend_from_slice(&len.to_be_bytes());
        let header_crc = Self::compute_crc(&frame[..HEADER_CHECKED]);
        frame.extend_from_slice(&header_crc.to_be_bytes());
        frame.extend_from_slice(&Self::compute_crc(&data).to_be_bytes());
        frame.extend_from_slice(&data);

        Ok(frame)
    }

    /// Deserialize one frame from the front of `bytes`
    ///
    /// Returns the entry and the number of bytes consumed
    pub fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        let header = match FrameHeader::parse(bytes) {
            HeaderParse::Valid(header) => header,
            HeaderParse::Short => {
                return Err(StashError::LogCorruption(format!(
                    "Incomplete header: expected {} bytes, got {}",
                    HEADER_SIZE,
                    bytes.len()
                )))
            }
            HeaderParse::Damaged { expected, actual } => {
                return Err(header_mismatch(expected, actual));
            }
        };

        let total_len = HEADER_SIZE + header.len;
        let data = bytes.get(HEADER_SIZE..total_len).ok_or_else(|| {
            StashError::LogCorruption(format!(
                "Incomplete entry {}: expected {} bytes, got {}",
                header.lsn,
                total_len,
                bytes.len()
            ))
        })?;

        Ok((Self::from_frame(header, data)?, total_len))
    }

    /// Validate the checksum and decode the data of a complete frame
    pub(crate) fn from_frame(header: FrameHeader, data: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(data);
        if actual != header.crc {
            return Err(StashError::LogCorruption(format!(
                "CRC mismatch for entry {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, actual
            )));
        }

        let (operation, timestamp): (Operation, u64) =
            bincode::deserialize(data).map_err(|e| {
                StashError::LogCorruption(format!("Undecodable entry {}: {}", header.lsn, e))
            })?;

        Ok(Self {
            lsn: header.lsn,
            operation,
            timestamp,
        })
    }

    /// CRC32 used for both the header and the entry data
    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

pub(crate) fn header_mismatch(expected: u32, actual: u32) -> StashError {
    StashError::LogCorruption(format!(
        "Header CRC mismatch: expected {:#010x}, got {:#010x}",
        expected, actual
    ))
}
