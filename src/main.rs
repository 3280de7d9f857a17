use iothub_to_twins::config;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    iothub_to_twins::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = config::Config::load_from_env()?;

    // not fatal: every invocation reports it again when the client is built
    if config.adt_service_url.is_none() {
        error!("Application setting \"ADT_SERVICE_URL\" not set");
    }

    let clients = iothub_to_twins::Clients::from_config(&config)?;

    run(service_fn(|request: LambdaEvent<Value>| {
        iothub_to_twins::handler(&clients, &config, request)
    }))
    .await
}
