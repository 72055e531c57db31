mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	future::Future,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use uuid::Uuid;

/// SQLite keeps these next to the main file in WAL mode.
const SIDECAR_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// A uniquely named SQLite file under the system temp directory.
pub struct TestDatabase {
	path: PathBuf,
	dsn: String,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new() -> Result<Self> {
		Self::in_dir(&env::temp_dir()).await
	}

	pub async fn in_dir(dir: &Path) -> Result<Self> {
		tokio::fs::create_dir_all(dir).await.map_err(|err| {
			Error::Message(format!("Failed to create test database directory {dir:?}: {err}."))
		})?;

		let path = dir.join(format!("bhub_test_{}.db", Uuid::new_v4().simple()));
		let dsn = format!("sqlite://{}?mode=rwc", path.display());

		Ok(Self { path, dsn, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		for path in database_files(&self.path) {
			match tokio::fs::remove_file(&path).await {
				Ok(()) => {},
				Err(err) if err.kind() == ErrorKind::NotFound => {},
				Err(err) => {
					return Err(Error::Message(format!(
						"Failed to remove test database file {path:?}: {err}."
					)));
				},
			}
		}

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		for path in database_files(&self.path) {
			if let Err(err) = fs::remove_file(&path)
				&& err.kind() != ErrorKind::NotFound
			{
				eprintln!("Test database cleanup failed for {path:?}: {err}.");
			}
		}
	}
}

pub async fn with_test_db<F, Fut, T>(f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let db = TestDatabase::new().await?;
	let result = f(&db).await;
	let mut db = db;

	if let Err(err) = db.cleanup_inner().await {
		eprintln!("Test database cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

fn database_files(path: &Path) -> Vec<PathBuf> {
	let mut files = vec![path.to_path_buf()];

	for suffix in SIDECAR_SUFFIXES {
		let mut sidecar = path.as_os_str().to_owned();

		sidecar.push(suffix);
		files.push(PathBuf::from(sidecar));
	}

	files
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn cleanup_removes_the_database_file() {
		let db = TestDatabase::new().await.expect("Failed to create test database.");
		let path = db.path().to_path_buf();

		tokio::fs::write(&path, b"").await.expect("Failed to touch database file.");

		assert!(db.dsn().starts_with("sqlite://"));
		assert!(path.exists());

		db.cleanup().await.expect("Failed to cleanup test database.");

		assert!(!path.exists());
	}

	#[tokio::test]
	async fn databases_can_live_in_a_dedicated_directory() {
		let dir = env::temp_dir().join(format!("bhub_testkit_{}", Uuid::new_v4().simple()));
		let db = TestDatabase::in_dir(&dir).await.expect("Failed to create test database.");

		assert!(dir.is_dir());
		assert_eq!(db.path().parent(), Some(dir.as_path()));
		assert!(db.dsn().contains(&dir.display().to_string()));

		db.cleanup().await.expect("Failed to cleanup test database.");
		tokio::fs::remove_dir(&dir).await.expect("Failed to remove test directory.");
	}

	#[tokio::test]
	async fn missing_files_are_not_an_error() {
		let db = TestDatabase::new().await.expect("Failed to create test database.");

		db.cleanup().await.expect("Cleanup of an unused database failed.");
	}
}
