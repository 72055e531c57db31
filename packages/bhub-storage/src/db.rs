use std::str::FromStr;

use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{Result, schema};

#[derive(Clone)]
pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &bhub_config::Sqlite) -> Result<Self> {
		let options =
			SqliteConnectOptions::from_str(&cfg.dsn)?.create_if_missing(true).foreign_keys(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_with(options)
			.await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// Trigger bodies contain `;`, so the script runs as one multi-statement batch.
		let mut tx = self.pool.begin().await?;

		sqlx::raw_sql(&sql).execute(&mut *tx).await?;

		tx.commit().await?;

		Ok(())
	}
}
