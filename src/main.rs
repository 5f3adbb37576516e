use blog_backend::{api, config::Config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    logging::init(config.log_json);

    tracing::info!("Starting blog backend...");

    api::start_server(&config).await
}
