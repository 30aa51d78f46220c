use anyhow::Context;
use log::info;
use user_accounts::{
    configuration::get_configuration,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("user-accounts".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;
    info!("Starting the application...");

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let application = Application::build(configuration).await?;
    info!("Listening on port {}", application.port());
    application.run_until_stopped().await?;

    Ok(())
}
