//! Local cart slot

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use hearth::cart::{CartCodecError, CartState};
use mockall::automock;
use thiserror::Error;
use tokio::fs;

/// Errors raised by the local cart slot.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// The slot could not be read or written.
    #[error("failed to access cart file {}", path.display())]
    Io {
        /// Slot location.
        path: PathBuf,

        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The slot holds something that isn't a cart.
    #[error("stored cart is corrupt")]
    Corrupt(#[from] CartCodecError),
}

#[automock]
#[async_trait]
/// A single named slot holding this device's cart.
pub trait LocalCartStore: Send + Sync {
    /// Reads the stored cart, or `None` if nothing has been stored yet.
    async fn load(&self) -> Result<Option<CartState>, LocalStoreError>;

    /// Overwrites the slot with `cart`.
    async fn save(&self, cart: &CartState) -> Result<(), LocalStoreError>;
}

/// Cart slot backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    /// Creates a store for the slot at `path`; parent directories are made on save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the slot.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> LocalStoreError {
        LocalStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LocalCartStore for FileCartStore {
    async fn load(&self) -> Result<Option<CartState>, LocalStoreError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(error)),
        };

        Ok(Some(CartState::from_json(&json)?))
    }

    async fn save(&self, cart: &CartState) -> Result<(), LocalStoreError> {
        let json = cart.to_json()?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|error| self.io_error(error))?;
        }

        // Write aside and rename so readers never see a half-written cart.
        let staging = self.path.with_extension("json.tmp");

        fs::write(&staging, json)
            .await
            .map_err(|error| self.io_error(error))?;

        fs::rename(&staging, &self.path)
            .await
            .map_err(|error| self.io_error(error))
    }
}
