use color_eyre::eyre::Result;
use tilelog::activity::user_activity;
use tilelog::config::Settings;
use tilelog::render::{render_layergroup, AsciiMap, HeatmapOverlay};
use tilelog::stats::{
    distinct_ip_addresses, distinct_layergroups, edited_layergroups, filter_by_type,
    most_requested_tiles, random_ip_address, random_layergroup, zoom_distribution,
};
use tilelog::EventStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn main() -> Result<()> {
    color_eyre::install()?;
    setup_tracing();

    let settings = Settings::load()?;
    let store = EventStore::read(&settings.log_file)?;
    report(&settings, &store)?;
    Ok(())
}

fn setup_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .map_or_else(|_| EnvFilter::new("info"), |env_filter| env_filter);

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Initialized tracing and logging systems");
}

fn report(settings: &Settings, store: &EventStore) -> Result<()> {
    let tiles = filter_by_type(store, &settings.tile_type);
    println!(
        "{} events, {} {} tiles, {} layergroups, {} sources",
        store.len(),
        tiles.len(),
        settings.tile_type,
        distinct_layergroups(store).len(),
        distinct_ip_addresses(store).len(),
    );

    match zoom_distribution(&tiles) {
        Ok(shares) => {
            println!("\nZoom distribution:");
            for share in shares {
                println!("  z{:<3} {:6.2}%", share.z, share.fraction * 100.0);
            }
        }
        Err(err) => warn!(%err, "No zoom distribution"),
    }

    let edited = edited_layergroups(store);
    println!("\nEdited layergroups: {}", edited.len());
    for layergroup in edited {
        println!("  {}: {}", layergroup.layergroup, layergroup.timestamps.join(", "));
    }

    let layergroup = settings
        .layergroup
        .as_deref()
        .or_else(|| random_layergroup(&tiles));
    if let Some(layergroup) = layergroup {
        let most_requested = most_requested_tiles(&tiles, layergroup)?;
        println!("\nMost requested tiles of {}:", layergroup);
        for tile in &most_requested {
            println!("  {}", tile);
        }

        let map = render_layergroup(&AsciiMap { zoom: settings.ascii_zoom }, &tiles, layergroup)?;
        println!("\nZoom {} map of {}:\n{}", settings.ascii_zoom, layergroup, map);

        let overlay = HeatmapOverlay {
            width: settings.heatmap_size,
            height: settings.heatmap_size,
        };
        let shapes = render_layergroup(&overlay, &tiles, layergroup)?;
        info!(layergroup, shapes = shapes.len(), "Computed heatmap overlay");
    }

    let ip_address = settings
        .ip_address
        .as_deref()
        .or_else(|| random_ip_address(store));
    if let Some(ip_address) = ip_address {
        println!("\nActivity of {}:", ip_address);
        for step in user_activity(store, ip_address) {
            println!("{}", step);
        }
    }

    Ok(())
}
