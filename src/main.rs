use listing_overlay::config::Config;
use listing_overlay::session::Session;
use listing_overlay::settings::JsonFileStore;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        page = %cfg.listings_page.display(),
        output = %cfg.output_path.display(),
        "Loading listings page"
    );

    let store = JsonFileStore::new(&cfg.settings_path);
    let session = Session::open(cfg, store).await?;

    let (watcher, notifications) = match session.install_watcher()? {
        Some((watcher, rx)) => (Some(watcher), Some(rx)),
        None => (None, None),
    };

    let stats = session
        .run(notifications, BufReader::new(tokio::io::stdin()))
        .await?;
    drop(watcher);

    println!("\n==============================");
    println!("OVERLAY RUNS: {} (rescans: {})", stats.runs, stats.rescans);
    println!("==============================\n");

    Ok(())
}
