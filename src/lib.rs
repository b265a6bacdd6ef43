pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod report;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use error::{LcaError, Result};
pub use model::*;
pub use report::{build_report, Converter, OutputFormat, PandocConverter, Report};
pub use session::SessionController;
pub use store::{Backend, BackendConfig, Descriptor, EntityStore};

/// Run one interactive session on stdin/stdout
pub async fn run_session() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let config = crate::config::AppConfig::load()?;
    let converter = PandocConverter::new(
        config.report.converter.clone(),
        config.report.template_dir.clone(),
    );
    let mut session = SessionController::new(config, Box::new(converter));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, tokio::io::stdout()).await
}
