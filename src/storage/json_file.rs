use super::{DocumentStore, StagedDataset};
use crate::domain::Document;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Dataset kept as a single JSON array file.
///
/// Staging writes a temporary file next to the dataset and swaps it in with a
/// rename, so readers only ever see the old or the new file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn read_documents(path: &Path) -> StoreResult<Vec<Document>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|_| StoreError::Malformed {
        path: path.display().to_string(),
    })
}

fn write_documents(file: &mut fs::File, documents: &[Document]) -> StoreResult<()> {
    let mut writer = BufWriter::new(&mut *file);
    serde_json::to_writer_pretty(&mut writer, documents)?;
    writer.flush()?;
    drop(writer);
    file.sync_all()?;
    Ok(())
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn read_all(&self) -> StoreResult<Vec<Document>> {
        read_documents(&self.path)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(read_documents(&self.path)?.len())
    }

    async fn clear(&self) -> StoreResult<usize> {
        let removed = read_documents(&self.path)?.len();
        fs::create_dir_all(self.parent_dir())?;
        let mut file = fs::File::create(&self.path)?;
        write_documents(&mut file, &[])?;
        debug!("Cleared {} documents from {}", removed, self.path.display());
        Ok(removed)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> StoreResult<usize> {
        let inserted = documents.len();
        let mut all = read_documents(&self.path)?;
        all.extend(documents);
        fs::create_dir_all(self.parent_dir())?;
        let mut file = fs::File::create(&self.path)?;
        write_documents(&mut file, &all)?;
        debug!("Inserted {} documents into {}", inserted, self.path.display());
        Ok(inserted)
    }

    async fn stage(&self, documents: Vec<Document>) -> StoreResult<Box<dyn StagedDataset>> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir)?;
        // Same directory as the target so the final rename stays on one filesystem
        let mut staging = NamedTempFile::new_in(&dir)?;
        write_documents(staging.as_file_mut(), &documents)?;
        debug!(
            "Staged {} documents at {}",
            documents.len(),
            staging.path().display()
        );
        Ok(Box::new(JsonFileStaged {
            staging,
            target: self.path.clone(),
            len: documents.len(),
        }))
    }
}

struct JsonFileStaged {
    staging: NamedTempFile,
    target: PathBuf,
    len: usize,
}

#[async_trait]
impl StagedDataset for JsonFileStaged {
    fn len(&self) -> usize {
        self.len
    }

    async fn swap_in(self: Box<Self>) -> StoreResult<usize> {
        let replaced = read_documents(&self.target)?.len();
        let JsonFileStaged {
            staging,
            target,
            len,
        } = *self;
        staging.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        info!(
            "Swapped {} documents into {} (replaced {})",
            len,
            target.display(),
            replaced
        );
        Ok(replaced)
    }
}
