//! Read-only access to datafiles on disk.

use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Memory-mapped datafile for zero-copy decoding.
pub struct MappedContainer {
    map: Option<Mmap>,
}

impl MappedContainer {
    /// Memory-map a datafile.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // Mapping a zero-length file fails on some platforms; an empty datafile
        // is still reported, just by the decoder instead.
        if file.metadata()?.len() == 0 {
            return Ok(Self { map: None });
        }
        // SAFETY: opened read-only; datafiles are immutable once written and
        // replaced only by rename, which leaves this mapping's inode intact.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map: Some(map) })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
