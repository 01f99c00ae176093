use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Content address of a cached result: SHA-1 over length-prefixed parts, so
/// `["ab", "c"]` and `["a", "bc"]` never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(sha1_smol::Digest);

impl Fingerprint {
    pub fn of(parts: &[&[u8]]) -> Fingerprint {
        let mut hasher = sha1_smol::Sha1::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Fingerprint(hasher.digest())
    }

    pub fn as_bytes(&self) -> [u8; 20] {
        self.0.bytes()
    }

    /// Lowercase hex, also used as the cache file name.
    pub fn hex(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A memo table from fingerprints to text results.
pub trait ContentStore {
    fn get(&self, key: &Fingerprint) -> Option<String>;
    fn put(&mut self, key: Fingerprint, value: &str) -> Result<(), Error>;
}

impl<S: ContentStore + ?Sized> ContentStore for Box<S> {
    fn get(&self, key: &Fingerprint) -> Option<String> {
        (**self).get(key)
    }

    fn put(&mut self, key: Fingerprint, value: &str) -> Result<(), Error> {
        (**self).put(key, value)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<Fingerprint, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, key: &Fingerprint) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: Fingerprint, value: &str) -> Result<(), Error> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }
}

/// One UTF-8 file per entry, named by the fingerprint's hex digest.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStore { root: root.into() }
    }

    /// Store under `TRANSCRIPT_PDF_CACHE`, else the platform cache directory.
    pub fn open_default() -> Option<Self> {
        default_cache_dir().map(DirStore::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        self.root.join(format!("{}.txt", key.hex()))
    }
}

impl ContentStore for DirStore {
    fn get(&self, key: &Fingerprint) -> Option<String> {
        std::fs::read_to_string(self.entry_path(key)).ok()
    }

    fn put(&mut self, key: Fingerprint, value: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.entry_path(&key);
        // Readers only ever see complete entries
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("cache: stored {} ({} bytes)", path.display(), value.len());
        Ok(())
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TRANSCRIPT_PDF_CACHE")
        && !dir.trim().is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    if cfg!(target_os = "macos") {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Caches/transcript-pdf"))
    } else if cfg!(target_os = "windows") {
        std::env::var("LOCALAPPDATA")
            .ok()
            .map(|d| PathBuf::from(d).join("transcript-pdf/cache"))
    } else {
        std::env::var("XDG_CACHE_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".cache"))
            })
            .map(|d| d.join("transcript-pdf"))
    }
}
