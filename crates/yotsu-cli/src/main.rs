use anyhow::{Context, bail};
use tracing::{info, warn};

use yotsu_api::{ApiClient, Backend};
use yotsu_client::{ChatClient, ClientConfig};
use yotsu_db::{Database, TokenVault};
use yotsu_gateway::HEARTBEAT_INTERVAL;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yotsu=debug".into()),
        )
        .init();

    let config = ClientConfig::from_env()?;

    // Refresh token lives in the local database; everything else is memory-only
    let db = Database::open(&config.db_path)?;
    let api = ApiClient::new(&config.api_url)?;
    let client = ChatClient::new(api, db).with_page_size(config.page_size);

    if client.restore_session().await? {
        info!("Resumed previous session");
    } else {
        sign_in(&client, &config).await?;
    }

    client.refresh_channels().await?;
    let channel_ids: Vec<_> = client.read(|store| store.channels().map(|c| c.channel_id).collect());
    info!("{} channels available", channel_ids.len());

    let token = client
        .read(|store| store.session().access_token().map(str::to_owned))
        .context("session has no access token")?;
    let (gateway, events) =
        yotsu_gateway::connect(&config.ws_url, &token, HEARTBEAT_INTERVAL).await?;

    for channel_id in channel_ids {
        gateway.subscribe(channel_id)?;
        if let Err(e) = client.fetch_messages(channel_id, None, config.page_size).await {
            warn!("Could not load channel {}: {}", channel_id, e);
        }
    }

    tokio::select! {
        _ = client.run_event_loop(events) => {
            info!("Gateway closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    gateway.close().await;
    Ok(())
}

async fn sign_in<B: Backend, V: TokenVault>(
    client: &ChatClient<B, V>,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.email, &config.password) else {
        bail!("no stored session; set YOTSU_EMAIL and YOTSU_PASSWORD to log in");
    };

    client.login(email, password).await?;
    if client.read(|store| store.session().is_2fa_required()) {
        let code = config
            .totp_code
            .as_deref()
            .context("account requires 2FA; set YOTSU_TOTP_CODE")?;
        client.verify_2fa(code).await?;
    }

    info!("Logged in as {}", email);
    Ok(())
}
