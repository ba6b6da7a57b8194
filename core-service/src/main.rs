use anyhow::Context;
use core_runtime::config::BrokerConfig;
use core_runtime::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging = LoggingConfig::from_env().context("invalid logging configuration")?;
    init_logging(logging).context("failed to initialize logging")?;

    let config = BrokerConfig::load().context("failed to load broker configuration")?;

    core_service::serve(config).await
}
