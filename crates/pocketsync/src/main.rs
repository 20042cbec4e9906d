mod config;

use std::env;
use std::fs;

use config::{build_context, config_path, load_config, resolve_path};
use library::LibrarySync;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path(env::args().nth(1));
    let config = load_config(&config_path)?;
    info!("Loaded config from {:?}", config_path);

    let context = build_context(&config_path, &config)?;
    info!(
        "Syncing {} artists from {:?} to {:?}",
        context.artists.len(),
        context.source_root,
        context.dest_root
    );

    let sync = LibrarySync::new(context, config.transcoder.build());
    let summary = sync.run();
    let totals = summary.totals();

    if let Some(report_path) = config.report_path.as_deref() {
        let report_path = resolve_path(&config_path, report_path);
        let written = serde_json::to_vec_pretty(&summary)
            .map_err(std::io::Error::from)
            .and_then(|bytes| fs::write(&report_path, bytes));
        match written {
            Ok(()) => info!("Wrote run report to {:?}", report_path),
            Err(err) => warn!("Failed to write run report {:?}: {}", report_path, err),
        }
    }

    for artist in &summary.missing_artists {
        warn!("Skipped missing artist: {}", artist);
    }

    println!(
        "Synced: {} albums, {} copied, {} converted, {} skipped, {} covers embedded, {} names fixed, {} failures",
        totals.albums,
        totals.copied,
        totals.converted,
        totals.skipped,
        totals.art_embedded,
        totals.names_changed,
        totals.failures
    );

    Ok(())
}
