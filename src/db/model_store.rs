//! On-disk persistence of catalog snapshots.
//!
//! A snapshot is stored as two blobs in one directory: the ordered book table and
//! the similarity matrix. Both carry the snapshot version and are only accepted
//! as a pair.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    engine::{CatalogSnapshot, SimilarityMatrix},
    error::{AppError, AppResult},
    models::Book,
};

pub const BOOKS_FILE: &str = "books.bin";
pub const MATRIX_FILE: &str = "similarity.bin";

#[derive(Serialize, Deserialize)]
struct BooksBlob {
    version: u64,
    built_at: DateTime<Utc>,
    books: Vec<Book>,
}

#[derive(Serialize, Deserialize)]
struct MatrixBlob {
    version: u64,
    size: usize,
    values: Vec<f32>,
}

/// Reads and writes the persisted snapshot pair under one directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes both blobs, each atomically, matrix first
    ///
    /// A crash between the two writes leaves a version mismatch, which
    /// [`Self::load`] rejects.
    pub fn save(&self, snapshot: &CatalogSnapshot) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let matrix = MatrixBlob {
            version: snapshot.version(),
            size: snapshot.matrix().size(),
            values: snapshot.matrix().values().to_vec(),
        };
        write_blob(&self.dir.join(MATRIX_FILE), &matrix)?;

        let books = BooksBlob {
            version: snapshot.version(),
            built_at: snapshot.built_at(),
            books: snapshot.books().to_vec(),
        };
        write_blob(&self.dir.join(BOOKS_FILE), &books)?;

        tracing::info!(
            dir = %self.dir.display(),
            version = snapshot.version(),
            books = snapshot.len(),
            "Snapshot persisted"
        );
        Ok(())
    }

    /// Loads the persisted snapshot, `None` when nothing has been saved yet
    pub fn load(&self) -> AppResult<Option<CatalogSnapshot>> {
        let books_path = self.dir.join(BOOKS_FILE);
        let matrix_path = self.dir.join(MATRIX_FILE);

        match (books_path.exists(), matrix_path.exists()) {
            (false, false) => return Ok(None),
            (true, true) => {}
            (books, _) => {
                let missing = if books { MATRIX_FILE } else { BOOKS_FILE };
                return Err(AppError::Persistence(format!(
                    "{} is missing from {}",
                    missing,
                    self.dir.display()
                )));
            }
        }

        let books: BooksBlob = read_blob(&books_path)?;
        let matrix: MatrixBlob = read_blob(&matrix_path)?;

        if books.version != matrix.version {
            return Err(AppError::Persistence(format!(
                "book table is version {} but similarity matrix is version {}",
                books.version, matrix.version
            )));
        }
        if books.books.len() != matrix.size {
            return Err(AppError::Persistence(format!(
                "book table has {} rows but similarity matrix has {}",
                books.books.len(),
                matrix.size
            )));
        }

        // re-derive normalized fields instead of trusting the blob
        let table: Vec<Book> = books
            .books
            .into_iter()
            .map(|b| Book::new(b.id, b.title, b.author, b.description, b.genres, b.image_url))
            .collect();
        let matrix = SimilarityMatrix::new(matrix.size, matrix.values)?;
        let snapshot = CatalogSnapshot::new(books.version, books.built_at, table, matrix)?;

        tracing::info!(
            version = snapshot.version(),
            books = snapshot.len(),
            built_at = %snapshot.built_at(),
            "Snapshot loaded from disk"
        );
        Ok(Some(snapshot))
    }

    /// Highest version found in whichever blobs still decode, even when the
    /// pair as a whole is rejected by [`Self::load`]
    pub fn stored_version(&self) -> Option<u64> {
        let books = read_blob::<BooksBlob>(&self.dir.join(BOOKS_FILE))
            .ok()
            .map(|blob| blob.version);
        let matrix = read_blob::<MatrixBlob>(&self.dir.join(MATRIX_FILE))
            .ok()
            .map(|blob| blob.version);
        books.max(matrix)
    }
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| {
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, value)?;
            writer.flush()?;
            Ok::<_, AppError>(())
        })
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) => AppError::Io(e),
            atomicwrites::Error::User(e) => e,
        })
}

fn read_blob<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let file = std::fs::File::open(path)?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
        AppError::Persistence(format!("{} is unreadable: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_snapshot;
    use crate::models::RawBookRecord;

    fn snapshot(version: u64) -> CatalogSnapshot {
        let records = vec![
            RawBookRecord::new()
                .with("id", "a")
                .with("title", "Dragon Road")
                .with("genres", "Fantasy"),
            RawBookRecord::new()
                .with("id", "b")
                .with("title", "Dragon Fire")
                .with("genres", "Fantasy, Adventure"),
            RawBookRecord::new()
                .with("id", "c")
                .with("title", "Cold Harbor")
                .with("genres", "Thriller"),
        ];
        build_snapshot(records, version).unwrap()
    }

    #[test]
    fn test_load_from_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let original = snapshot(7);

        store.save(&original).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded.version(), 7);
        assert_eq!(loaded.built_at(), original.built_at());
        assert_eq!(loaded.books(), original.books());
        assert_eq!(loaded.matrix(), original.matrix());
        assert_eq!(loaded.centrality_at(1), original.centrality_at(1));
    }

    #[test]
    fn test_save_overwrites_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        store.save(&snapshot(1)).unwrap();
        store.save(&snapshot(2)).unwrap();

        assert_eq!(store.load().unwrap().unwrap().version(), 2);
    }

    #[test]
    fn test_missing_half_of_pair_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&snapshot(1)).unwrap();
        std::fs::remove_file(dir.path().join(MATRIX_FILE)).unwrap();

        assert!(matches!(store.load(), Err(AppError::Persistence(_))));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let other = tempfile::tempdir().unwrap();
        let other_store = ModelStore::new(other.path());

        store.save(&snapshot(1)).unwrap();
        other_store.save(&snapshot(2)).unwrap();
        std::fs::copy(other.path().join(MATRIX_FILE), dir.path().join(MATRIX_FILE)).unwrap();

        assert!(matches!(store.load(), Err(AppError::Persistence(_))));
    }

    #[test]
    fn test_corrupt_blob_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&snapshot(1)).unwrap();
        std::fs::write(dir.path().join(BOOKS_FILE), b"not bincode").unwrap();

        assert!(matches!(store.load(), Err(AppError::Persistence(_))));
    }

    #[test]
    fn test_stored_version_survives_damaged_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        assert_eq!(store.stored_version(), None);

        store.save(&snapshot(7)).unwrap();
        std::fs::write(dir.path().join(BOOKS_FILE), b"not bincode").unwrap();
        assert!(store.load().is_err());
        assert_eq!(store.stored_version(), Some(7));

        std::fs::remove_file(dir.path().join(MATRIX_FILE)).unwrap();
        assert_eq!(store.stored_version(), None);
    }
}
