//! [`KvStore`] persisted as a JSON object on local disk.
//!
//! The whole map is rewritten after every `set` through a sibling `.tmp` file and a rename,
//! so a crash mid-write leaves the previous snapshot intact.

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreError, StoreFuture},
};

fn backend(action: &str, path: &Path, e: impl Display) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

/// Single-host store keeping an in-memory copy of the file's key/value object.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<BTreeMap<String, String>>>,
}
impl FileStore {
	/// Opens the store at `path`, creating parent directories and loading any existing file.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| backend("create", dir, e))?;
		}

		let entries = match fs::read(&path) {
			Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("{} is not a JSON string map: {e}", path.display()),
			})?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(backend("read", &path, e)),
		};

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write_snapshot(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
		let json = serde_json::to_vec_pretty(entries)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;
		let staging = self.path.with_extension("tmp");

		fs::write(&staging, json).map_err(|e| backend("write", &staging, e))?;
		fs::rename(&staging, &self.path).map_err(|e| backend("replace", &self.path, e))
	}
}
impl KvStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.entries.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			entries.insert(key.to_owned(), value);
			self.write_snapshot(&entries)
		})
	}
}
