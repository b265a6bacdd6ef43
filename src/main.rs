use env_logger::{Builder, Env};
use log::LevelFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Warnings only unless RUST_LOG says otherwise; the session owns stdout
    Builder::from_env(Env::default().default_filter_or("warn"))
        .filter_module("reqwest", LevelFilter::Warn)
        .init();

    up_report::run_session().await
}
