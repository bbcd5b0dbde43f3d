use crate::core::error::{Error, Result};
use crate::core::write_batch::BatchOperation;
use bincode::{Decode, Encode};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Upper bound on a single encoded record; anything larger is corruption.
const MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;

/// One atomic unit in the log: every operation of a put, delete or batch.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WalRecord {
    pub sequence: u64,
    pub operations: Vec<BatchOperation>,
    pub checksum: u32,
}

impl WalRecord {
    pub fn new(sequence: u64, operations: Vec<BatchOperation>) -> Self {
        let mut record = Self {
            sequence,
            operations,
            checksum: 0,
        };
        record.checksum = record.calculate_checksum();
        record
    }

    pub fn calculate_checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.sequence.to_le_bytes());
        for op in &self.operations {
            match op {
                BatchOperation::Put { key, value } => {
                    hasher.update(b"PUT");
                    hasher.update(&(key.len() as u64).to_le_bytes());
                    hasher.update(key);
                    hasher.update(&(value.len() as u64).to_le_bytes());
                    hasher.update(value);
                }
                BatchOperation::Delete { key } => {
                    hasher.update(b"DEL");
                    hasher.update(&(key.len() as u64).to_le_bytes());
                    hasher.update(key);
                }
            }
        }
        hasher.finalize()
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == self.calculate_checksum()
    }
}

/// The file operations an append needs.
trait LogFile: Write {
    fn sync_frame(&mut self) -> io::Result<()>;

    /// Cut the file back to `len` bytes and continue writing there.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync_frame(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

/// Append-only write-ahead log.
///
/// Layout: a sequence of `[u32 little-endian length][bincode WalRecord]`.
/// A failed append is cut back off the file, so records always start on a
/// frame boundary and a crash can only leave a short final record, which
/// recovery discards as a whole.
#[derive(Debug)]
pub struct WriteAheadLog {
    path: PathBuf,
    file: Mutex<File>,
    next_sequence: AtomicU64,
    size_bytes: AtomicU64,
    /// A failed append could not be cut back; the next append retries it
    needs_repair: AtomicBool,
    sync: bool,
}

impl WriteAheadLog {
    /// Open (or create) the log at `path` and return the records it holds.
    pub fn open(path: &Path, sync: bool) -> Result<(Self, Vec<WalRecord>)> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let (records, valid_len) = decode_records(&data)?;
        if valid_len < data.len() as u64 {
            warn!(
                path = %path.display(),
                valid_len,
                file_len = data.len(),
                "Discarding torn record at WAL tail"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(valid_len))?;

        let max_sequence = records.iter().map(|r| r.sequence).max().unwrap_or(0);
        info!(
            path = %path.display(),
            records = records.len(),
            max_sequence,
            "WAL opened"
        );

        let wal = Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            next_sequence: AtomicU64::new(max_sequence + 1),
            size_bytes: AtomicU64::new(valid_len),
            needs_repair: AtomicBool::new(false),
            sync,
        };
        Ok((wal, records))
    }

    /// Append one atomic record and return its sequence number
    pub fn append(&self, operations: Vec<BatchOperation>) -> Result<u64> {
        let mut file = self.file.lock();

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let frame = encode_frame(&WalRecord::new(sequence, operations))?;
        append_frame(
            &mut *file,
            &frame,
            self.sync,
            self.size_bytes(),
            &self.needs_repair,
        )?;

        self.size_bytes
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        debug!(sequence, bytes = frame.len(), "WAL append");
        Ok(sequence)
    }

    /// Drop every record; called once their contents are in the table file.
    pub fn reset(&self) -> Result<()> {
        let mut file = self.file.lock();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;
        self.size_bytes.store(0, Ordering::Relaxed);
        self.needs_repair.store(false, Ordering::Release);
        debug!(path = %self.path.display(), "WAL reset");
        Ok(())
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    pub fn last_sequence(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst) - 1
    }
}

fn encode_frame(record: &WalRecord) -> Result<Vec<u8>> {
    let payload = bincode::encode_to_vec(record, bincode::config::standard())?;
    if payload.len() > MAX_RECORD_SIZE {
        return Err(Error::InvalidArgument(format!(
            "WAL record of {} bytes exceeds maximum {}",
            payload.len(),
            MAX_RECORD_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Write `frame` at `valid_len`, the end of the last complete record.
///
/// On a failed write or sync the partial frame is cut off again. If that
/// cut fails too, `needs_repair` is set and the next append redoes it before
/// writing.
fn append_frame<F: LogFile>(
    file: &mut F,
    frame: &[u8],
    sync: bool,
    valid_len: u64,
    needs_repair: &AtomicBool,
) -> Result<()> {
    if needs_repair.load(Ordering::Acquire) {
        file.truncate_to(valid_len)?;
        needs_repair.store(false, Ordering::Release);
        info!(valid_len, "Removed partial WAL record left by a failed append");
    }

    let written = file
        .write_all(frame)
        .and_then(|()| if sync { file.sync_frame() } else { Ok(()) });
    if let Err(err) = written {
        if let Err(cut) = file.truncate_to(valid_len) {
            needs_repair.store(true, Ordering::Release);
            warn!(error = %cut, valid_len, "Failed to remove partial WAL record");
        }
        return Err(err.into());
    }
    Ok(())
}

/// Decode every complete record. Returns the records and the length of the
/// valid prefix; bytes past it belong to a torn final record.
fn decode_records(data: &[u8]) -> Result<(Vec<WalRecord>, u64)> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        if data.len() - offset < 4 {
            break;
        }
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(&data[offset..offset + 4]);
        let length = u32::from_le_bytes(len_buf) as usize;

        if length == 0 || length > MAX_RECORD_SIZE {
            return Err(Error::WalCorruption {
                offset: offset as u64,
                reason: format!("invalid record length {}", length),
            });
        }
        let start = offset + 4;
        if data.len() - start < length {
            break;
        }

        let (record, _) = bincode::decode_from_slice::<WalRecord, _>(
            &data[start..start + length],
            bincode::config::standard(),
        )
        .map_err(|e| Error::WalCorruption {
            offset: offset as u64,
            reason: format!("record decode failed: {}", e),
        })?;

        if !record.verify_checksum() {
            return Err(Error::ChecksumMismatch {
                expected: record.calculate_checksum(),
                actual: record.checksum,
            });
        }

        records.push(record);
        offset = start + length;
    }

    Ok((records, offset as u64))
}
