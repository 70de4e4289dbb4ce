//! Thread-safe in-memory [`KvStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of keys currently stored.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been stored yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: &str) -> Option<String> {
		map.read().get(key).cloned()
	}

	fn set_now(map: StoreMap, key: &str, value: String) -> Result<(), StoreError> {
		map.write().insert(key.to_owned(), value);

		Ok(())
	}
}
impl KvStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, key, value) })
	}
}
