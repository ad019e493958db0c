//! Artisan Studio command-line driver
//!
//! Talks to the marketplace API configured through the environment
//! (`ARTISAN_API_BASE_URL` and friends, or a `.env` file).
//!
//! ```bash
//! artisan-studio list            # page through the whole catalog
//! artisan-studio tail <id>       # stream tagline copy for a product
//! artisan-studio remove <id>     # soft-delete a product
//! ```

use artisan_studio_core::{ProductSummary, StreamEvent};
use artisan_studio_http::{CancellationToken, RequestClient};
use artisan_studio_workflow::{
    CatalogPager, HttpMarketplace, MarketplaceBackend, TaglineRequest, WorkflowConfig,
};
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: artisan-studio <list | tail <product-id> | remove <product-id>>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artisan_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkflowConfig::from_env()?;
    let client = RequestClient::from_env()?;
    tracing::info!(base_url = %client.base_url(), page_size = config.page_size, "Configuration loaded");
    let backend: Arc<dyn MarketplaceBackend> = Arc::new(HttpMarketplace::new(client));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list"] => list(backend, &config).await,
        ["tail", id] => tail(backend.as_ref(), &config, id).await,
        ["remove", id] => {
            backend.set_active((*id).to_string(), false).await?;
            println!("removed {id}");
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

async fn list(
    backend: Arc<dyn MarketplaceBackend>,
    config: &WorkflowConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pager = CatalogPager::new(backend, config.page_size);
    let mut page = pager.load_first().await?;
    loop {
        page.items.iter().for_each(print_row);
        if pager.is_exhausted() {
            break;
        }
        page = pager.load_more().await?;
    }
    tracing::info!(total = pager.items().len(), "Catalog listed");
    Ok(())
}

fn print_row(item: &ProductSummary) {
    let inventory = item
        .inventory
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    println!("{}\t{}\t{}\t{}\t{}", item.id, item.name, item.theme, item.kind, inventory);
}

async fn tail(
    backend: &dyn MarketplaceBackend,
    config: &WorkflowConfig,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = TaglineRequest {
        product_id: id.to_string(),
        channel: config.channel.clone(),
        lang: config.lang.clone(),
        tone: config.tone.clone(),
    };
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            interrupt.cancel();
        }
    });

    let mut events = match backend.stream_taglines(request, cancel).await {
        Ok(events) => events,
        Err(e) if e.is_cancelled() => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let mut stdout = std::io::stdout();

    // A cancelled stream simply ends
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Delta(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            StreamEvent::Text(text) => writeln!(stdout, "{text}")?,
            StreamEvent::Structured(value) => {
                tracing::debug!(%value, "structured event");
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}
