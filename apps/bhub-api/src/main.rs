use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = bhub_api::Args::parse();

	bhub_api::run(args).await
}
