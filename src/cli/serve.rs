use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::api::{self, ApiState};
use crate::config::load_config;
use crate::error::StreamalertError;
use crate::jobs::{
    broadcaster_sync_routine, http_api_routine, sync_broadcasters, token_refresh_routine,
};
use crate::provider::IdentityClient;
use crate::refresh::{RefreshEngine, RetryPolicy};
use crate::store::{FileBroadcasterStore, FileCredentialStore, FileUserStore};
use crate::supervisor::Supervisor;

/// Wire up stores, the platform client, and the background routines, then
/// block until shutdown.
pub async fn run_serve(config_path: Option<&str>) -> Result<(), StreamalertError> {
    let config = load_config(config_path)?;
    let data_dir = config.data_dir();

    let credentials = Arc::new(FileCredentialStore::open(&data_dir));
    let broadcasters = Arc::new(FileBroadcasterStore::open(&data_dir));
    let users = Arc::new(FileUserStore::open(&data_dir));

    let client = Arc::new(IdentityClient::new(&config.platform)?);
    let engine = Arc::new(RefreshEngine::new(credentials.clone(), client.clone()));

    // Boot-time pass: first token acquisition and identity catch-up, before
    // anything goes live. Errors here abort the boot.
    engine.ensure_fresh().await?;
    sync_broadcasters(client.as_ref(), broadcasters.as_ref(), credentials.as_ref()).await?;

    let listener = TcpListener::bind(&config.http.bind_addr).await?;
    tracing::info!(addr = %config.http.bind_addr, "http api listening");

    let app = api::router(Arc::new(ApiState {
        users,
        broadcasters: broadcasters.clone(),
        auth: config.auth.clone(),
    }));

    let interval = Duration::from_secs(config.refresh.interval_secs);
    let mut supervisor = Supervisor::new();
    supervisor.start(vec![
        token_refresh_routine(engine, RetryPolicy::from_config(&config.refresh), interval),
        broadcaster_sync_routine(client, broadcasters, credentials, interval),
        http_api_routine(listener, app),
    ]);

    supervisor
        .wait_for_shutdown()
        .await
        .map_err(|failure| failure.into_error())
}
