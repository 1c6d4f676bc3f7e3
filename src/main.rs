mod app;
mod auth;
mod comments;
mod config;
mod db;
mod error;
mod extract;
#[cfg(test)]
mod memory;
mod posts;
mod state;
mod storage;
mod uploads;
mod users;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "inkpost=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().with_current_span(true).init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;
    tracing::info!(
        page_size = state.config.feed.page_size,
        reply_depth = state.config.feed.reply_depth,
        "configuration loaded"
    );
    app::serve(app::build_app(state)).await
}
