//! Single-slot persistence for the recipe collection.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use crate::models::Recipe;

/// File name of the persisted collection inside the data root.
pub const STORE_FILE: &str = "recipes.json";

/// Failures surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("failed to access store file {path}")]
    Io {
        /// Path of the store file involved.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: io::Error,
    },
    /// Encoding the collection failed.
    #[error("failed to encode recipe collection")]
    Encode(#[source] serde_json::Error),
}

/// Durable storage for the whole recipe collection under one well-known
/// file. The store owns only the encode/decode contract; callers own the
/// in-memory collection.
pub struct RecipeStore {
    path: PathBuf,
}

impl RecipeStore {
    /// Create a store backed by the given data directory.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            path: data_root.into().join(STORE_FILE),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted collection.
    ///
    /// A missing file is the empty collection, not an error. A present but
    /// undecodable file is logged and also treated as empty, so a damaged
    /// store never wedges startup; the next `save` overwrites it.
    pub fn load(&self) -> Result<Vec<Recipe>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        match serde_json::from_str(&contents) {
            Ok(recipes) => Ok(recipes),
            Err(err) => {
                warn!("Discarding malformed store {}: {err}", self.path.display());
                Ok(Vec::new())
            }
        }
    }

    /// Encode the full collection and overwrite the persisted value.
    pub fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
        let serialized = serde_json::to_vec_pretty(recipes).map_err(StoreError::Encode)?;
        fs::write(&self.path, serialized).map_err(|err| StoreError::Io {
            path: self.path.clone(),
            source: err,
        })
    }

    /// Remove the persisted value entirely, as if nothing was ever saved.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_recipe(title: &str) -> Recipe {
        Recipe {
            img_src: "a.jpg".to_string(),
            img_alt: "alt".to_string(),
            title_lnk: "http://x".to_string(),
            title_txt: title.to_string(),
            organization: "Chef".to_string(),
            rating: 4,
            num_ratings: 10,
            length_time: "PT30M".to_string(),
            ingredients: "carrot, salt".to_string(),
        }
    }

    #[test]
    fn load_before_any_save_is_empty() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path());
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_load_round_trip_preserves_fields_and_order() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path());

        let recipes = vec![sample_recipe("Soup"), sample_recipe("Stew")];
        store.save(&recipes).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, recipes);
        assert_eq!(loaded[0].title_txt, "Soup");
        assert_eq!(loaded[1].title_txt, "Stew");
    }

    #[test]
    fn save_replaces_the_prior_value() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path());

        store
            .save(&[sample_recipe("Soup"), sample_recipe("Stew")])
            .unwrap();
        store.save(&[sample_recipe("Broth")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title_txt, "Broth");
    }

    #[test]
    fn clear_returns_the_store_to_the_never_saved_state() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path());

        store.save(&[sample_recipe("Soup")]).unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), Vec::new());

        // Clearing again is still a success.
        store.clear().unwrap();
    }

    #[test]
    fn malformed_store_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path());

        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path().join("nested").join("data"));

        store.save(&[sample_recipe("Soup")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
