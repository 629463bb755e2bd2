use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = yota_api::Args::parse();

	yota_api::run(args).await
}
