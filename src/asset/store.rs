//! Where face images come from

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::PathBuf;

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Byte store keyed by expression name
pub trait AssetStore {
    /// Open the image stored for `name`, `None` when there is none
    fn open(&self, name: &str) -> Option<Box<dyn ReadSeek + '_>>;
}

/// `<root>/<name>.bmp` on a mounted filesystem, e.g. the SD card
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> Option<PathBuf> {
        // Names come from the network; keep them inside the root
        let safe = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if name.is_empty() || !name.chars().all(safe) {
            return None;
        }
        Some(self.root.join(format!("{}.bmp", name)))
    }
}

impl AssetStore for DirStore {
    fn open(&self, name: &str) -> Option<Box<dyn ReadSeek + '_>> {
        let path = self.path(name)?;
        match File::open(&path) {
            Ok(file) => Some(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to open {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Images kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    assets: HashMap<String, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(name.into(), bytes);
    }
}

impl AssetStore for MemStore {
    fn open(&self, name: &str) -> Option<Box<dyn ReadSeek + '_>> {
        let bytes = self.assets.get(name)?;
        Some(Box::new(Cursor::new(bytes.as_slice())))
    }
}
