use std::sync::Arc;

use bhub_service::BhubService;
use bhub_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<BhubService>,
}
impl AppState {
	/// Opens the database and makes sure the record tables and the text index exist.
	pub async fn new(config: bhub_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.sqlite).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(BhubService::new(config, db)) })
	}
}
