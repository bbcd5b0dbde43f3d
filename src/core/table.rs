use crate::core::error::{Error, Result};
use crate::core::memtable::MemTable;
use bincode::{Decode, Encode};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, info};

const TABLE_MAGIC: &[u8; 8] = b"KVPTBL01";

#[derive(Debug, Encode, Decode)]
struct TableImage {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    checksum: u32,
}

fn image_checksum(entries: &[(Vec<u8>, Vec<u8>)]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&(entries.len() as u64).to_le_bytes());
    for (key, value) in entries {
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key);
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value);
    }
    hasher.finalize()
}

/// Immutable sorted run of live entries, persisted as one file.
///
/// A flush builds a new table from the old one plus the memtable and
/// replaces the file with a rename, so readers always see a whole table.
#[derive(Debug, Default, Clone)]
pub struct Table {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    size_bytes: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table at `path`; a missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(e.into()),
        };

        if data.len() < TABLE_MAGIC.len() || &data[..TABLE_MAGIC.len()] != TABLE_MAGIC {
            return Err(Error::CorruptedDatabase(format!(
                "{} is not a table file",
                path.display()
            )));
        }

        let (image, _) = bincode::decode_from_slice::<TableImage, _>(
            &data[TABLE_MAGIC.len()..],
            bincode::config::standard(),
        )?;
        let actual = image_checksum(&image.entries);
        if actual != image.checksum {
            return Err(Error::ChecksumMismatch {
                expected: image.checksum,
                actual,
            });
        }

        let table = Self::from_entries(image.entries);
        info!(path = %path.display(), entries = table.len(), "Table loaded");
        Ok(table)
    }

    fn from_entries(entries: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        let mut table = Self::empty();
        for (key, value) in entries {
            table.size_bytes += key.len() + value.len();
            table.entries.insert(key, value);
        }
        table
    }

    /// Apply the memtable on top of this table; tombstones remove keys.
    pub fn merge(&self, memtable: &MemTable) -> Self {
        let mut entries = self.entries.clone();
        for (key, value) in memtable.entries() {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Self::from_entries(entries)
    }

    /// Write the table to `path` through a temporary file and a rename.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let image = TableImage {
            checksum: image_checksum(&entries),
            entries,
        };
        let payload = bincode::encode_to_vec(&image, bincode::config::standard())?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(TABLE_MAGIC)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        debug!(
            path = %path.display(),
            entries = self.len(),
            bytes = payload.len() + TABLE_MAGIC.len(),
            "Table persisted"
        );
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    /// First entry whose key satisfies `lower`
    pub fn first_from(&self, lower: Bound<&[u8]>) -> Option<(&Vec<u8>, &Vec<u8>)> {
        self.entries
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw key and value bytes held
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_merge_applies_tombstones() {
        let memtable = MemTable::new();
        memtable.insert(b"a".to_vec(), b"1".to_vec());
        memtable.insert(b"b".to_vec(), b"2".to_vec());
        let table = Table::empty().merge(&memtable);

        let memtable = MemTable::new();
        memtable.delete(b"a".to_vec());
        memtable.insert(b"c".to_vec(), b"3".to_vec());
        let table = table.merge(&memtable);

        assert_eq!(table.len(), 2);
        assert!(table.get(b"a").is_none());
        assert_eq!(table.get(b"b"), Some(&b"2".to_vec()));
        assert_eq!(table.size_bytes(), 4);
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TABLE");

        let memtable = MemTable::new();
        memtable.insert(b"k\x00ey".to_vec(), b"v\x00al".to_vec());
        memtable.insert(b"other".to_vec(), Vec::new());
        let table = Table::empty().merge(&memtable);
        table.persist(&path).unwrap();

        let loaded = Table::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(b"k\x00ey"), Some(&b"v\x00al".to_vec()));
        assert_eq!(loaded.get(b"other"), Some(&Vec::new()));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let table = Table::load(&dir.path().join("TABLE")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_bad_magic_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TABLE");
        fs::write(&path, b"garbage!garbage").unwrap();

        let err = Table::load(&path).unwrap_err();
        assert!(err.is_corruption());
    }
}
