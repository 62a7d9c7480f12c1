//! User state persistence with file locking.
//!
//! This module handles saving and loading the persisted [`UserState`]
//! (progress, presets, monthly stats, capsules) with proper file locking to
//! prevent concurrent access issues. Loading never fails on bad data: each
//! section that cannot be parsed falls back to its default on its own.

use crate::{Error, Result, UserState};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserState {
    /// Load user state from a file with shared locking
    ///
    /// Returns default state if the file doesn't exist or cannot be read.
    /// A malformed section is logged and replaced by its default while the
    /// remaining sections are kept.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        let root = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("State file {:?} is not an object. Using defaults.", path);
                return Ok(Self::default());
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        let state = UserState {
            progress: section(&root, "progress"),
            saved_timers: section(&root, "saved_timers"),
            monthly: section(&root, "monthly"),
            capsules: section(&root, "capsules"),
        };
        tracing::debug!("Loaded user state from {:?}", path);
        Ok(state)
    }

    /// Save user state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}

/// Deserialize one top-level section, falling back to its default
fn section<T: DeserializeOwned + Default>(root: &Map<String, Value>, key: &str) -> T {
    match root.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed '{}' section in state: {}. Using defaults.", key, e);
                T::default()
            }
        },
    }
}
