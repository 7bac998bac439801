//! Table loading: decode a data file on disk into a [`Table`]

use crate::csv_loader::CsvLoader;
use crate::error::DecodeError;
use crate::parquet_loader::ParquetLoader;
use crate::table::Table;
use std::path::Path;
use std::sync::Arc;

/// Decodes one file format into tables
pub trait TableLoader: Send + Sync {
    /// Lowercase file extensions handled by this loader, without the dot
    fn extensions(&self) -> &[&'static str];

    /// Read the file at `path` into memory. Never modifies the file.
    fn load(&self, path: &Path) -> Result<Table, DecodeError>;
}

/// Extension-keyed set of loaders
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: Vec<Arc<dyn TableLoader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
            .with_loader(ParquetLoader)
            .with_loader(CsvLoader::default())
            .with_loader(CsvLoader::tsv())
    }
}

impl LoaderRegistry {
    /// Registry without any loaders
    pub fn new() -> Self {
        Self { loaders: Vec::new() }
    }

    pub fn with_loader(mut self, loader: impl TableLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    /// Every extension some registered loader accepts
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .loaders
            .iter()
            .flat_map(|l| l.extensions().iter().map(|e| e.to_string()))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// Find the loader for a file by its extension
    pub fn loader_for(&self, path: &Path) -> Option<&dyn TableLoader> {
        let extension = file_extension(path)?;
        self.loaders
            .iter()
            .find(|l| l.extensions().iter().any(|e| *e == extension))
            .map(|l| l.as_ref())
    }

    /// Load a file with whichever loader claims its extension
    pub fn load(&self, path: &Path) -> Result<Table, DecodeError> {
        let loader = self.loader_for(path).ok_or_else(|| {
            DecodeError::new(format!("Unsupported file type: {}", path.display()))
        })?;
        log::debug!("Loading {}", path.display());
        loader.load(path)
    }
}

/// Lowercased extension of a path, if it has one
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
