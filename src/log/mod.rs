//! Record Log Module
//!
//! Append-only log backing [`FileMemory`](crate::memory::FileMemory).
//!
//! ## Responsibilities
//! - Append a record for every mutation before it becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Entry 1                                                  │
//! │ ┌─────────┬─────────┬──────────────┬────────────┬──────┐ │
//! │ │ LSN (8) │ Len (4) │ Hdr CRC (4)  │ CRC (4)    │ Data │ │
//! │ └─────────┴─────────┴──────────────┴────────────┴──────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Entry 2                                                  │
//! │ ┌─────────┬─────────┬──────────────┬────────────┬──────┐ │
//! │ │ LSN (8) │ Len (4) │ Hdr CRC (4)  │ CRC (4)    │ Data │ │
//! │ └─────────┴─────────┴──────────────┴────────────┴──────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. `Data` is the bincode encoding of the
//! operation and its timestamp. The header CRC covers LSN and length, the
//! second CRC covers `Data`. A damaged length is therefore detected instead
//! of being mistaken for a torn tail.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{LogEntry, Operation, HEADER_SIZE};
pub use reader::{Frame, LogIterator, LogReader};
pub use recovery::{LogRecovery, RecoveryResult};
pub use writer::LogWriter;
