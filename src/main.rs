use rpc_handler_registry::{
    build_app, config::Config, health, logging, registry::HandlerRegistry, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;

    let mut builder = HandlerRegistry::builder();
    match &config.health_path {
        Some(path) => builder.add_service_at(path.as_str(), health::service(), None, None),
        None => builder.add_service(health::service(), None),
    };
    let registry = builder.build()?;

    let app = build_app(AppState::new(registry));
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
