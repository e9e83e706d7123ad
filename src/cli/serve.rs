use std::net::SocketAddr;
use tracing::info;
use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config::VulnscanConfig;
use crate::errors::VulnscanError;

pub async fn handle_serve(args: ServeArgs, config: VulnscanConfig) -> Result<(), VulnscanError> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    info!(%host, port, database = %config.database.path, scanner = %config.scanner.socket_path, "Starting API server");

    let state = api::create_app_state(&config)?;
    if state.db.count_admins()? == 0 {
        info!("No admin account yet, create one with `vulnscan create-admin`");
    }
    let app = api::build_router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| VulnscanError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
