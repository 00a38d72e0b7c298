use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use train_board::digitraffic::{DEFAULT_BASE_URL, FeedConfig, LiveTrainClient, MockFeed};
use train_board::domain::{StationCode, format_clock};
use train_board::engine::{
    EngineConfig, QueryEngine, QueryResult, SearchError, SelectionError, TrainSource,
};
use train_board::stations::{
    DirectoryLoader, StationCache, StationCacheConfig, StationClient, StationClientConfig,
    StationDirectory,
};

/// How often to refresh the station directory (24 hours).
const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How often to retry while the station directory cannot be loaded.
const STATION_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Board shown when no stations are given on the command line.
const DEFAULT_PAIR: (&str, Option<&str>) = ("HKI", Some("MÄK"));

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let base_url = std::env::var("TRAINS_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let user = std::env::var("TRAINS_USER").unwrap_or_else(|_| "train-board".to_string());
    let cache_path =
        std::env::var("TRAINS_STATION_CACHE").unwrap_or_else(|_| "stations_cache.json".to_string());

    // Stations from the command line: `train-board [from] [to]`
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (from, to) = match args.as_slice() {
        [] => (
            DEFAULT_PAIR.0.to_string(),
            DEFAULT_PAIR.1.map(str::to_string),
        ),
        [from] => (from.clone(), None),
        [from, to, ..] => (from.clone(), Some(to.clone())),
    };
    let from = StationCode::parse_normalized(&from).expect("Invalid departure station code");
    let to = to
        .map(|to| StationCode::parse_normalized(&to))
        .transpose()
        .expect("Invalid destination station code");

    // Load the station directory (cache first, then API)
    let station_client = StationClient::new(
        StationClientConfig::default()
            .with_base_url(&base_url)
            .with_user(&user),
    )
    .expect("Failed to create station client");
    let loader = DirectoryLoader::new(
        station_client,
        StationCache::new(StationCacheConfig::new(cache_path)),
    );
    let directory = StationDirectory::new();
    match loader.load_or_fetch(&directory).await {
        Ok(source) => info!(?source, count = directory.len().await, "station directory ready"),
        Err(e) => warn!(error = %e, "station directory unavailable, retrying in the background"),
    }

    // Keep retrying until the directory loads, then refresh it daily
    let directory_refresh = directory.clone();
    tokio::spawn(async move {
        if !directory_refresh.is_loaded().await {
            let source = loader
                .load_with_retry(&directory_refresh, STATION_RETRY_INTERVAL)
                .await;
            let count = directory_refresh.len().await;
            info!(?source, count, "station directory ready");
        }

        let mut interval = tokio::time::interval(STATION_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match loader.refresh(&directory_refresh).await {
                Ok(count) => info!(count, "refreshed station directory"),
                Err(e) => warn!(error = %e, "failed to refresh station directory"),
            }
        }
    });

    let config = EngineConfig::default();

    match std::env::var("TRAINS_MOCK_DIR") {
        Ok(dir) => {
            let feed = MockFeed::new(&dir).expect("Failed to load mock data");
            info!(%dir, "using mock live-train data");
            run(feed, directory, config, from, to).await;
        }
        Err(_) => {
            let client = LiveTrainClient::new(
                FeedConfig::default().with_base_url(&base_url).with_user(&user),
            )
            .expect("Failed to create live-train client");
            run(client, directory, config, from, to).await;
        }
    }
}

/// Show the board for `from` (optionally towards `to`) until interrupted.
async fn run<S: TrainSource + 'static>(
    source: S,
    directory: StationDirectory,
    config: EngineConfig,
    from: StationCode,
    to: Option<StationCode>,
) {
    let engine = Arc::new(QueryEngine::new(source, directory, config));
    let mut updates = engine.subscribe();

    // The directory may still be loading; wait for it before giving up on
    // the requested stations
    loop {
        let Err(e) = engine.select(from.clone(), to.clone()).await else {
            break;
        };
        let loaded = engine.directory().is_loaded().await;

        match &e {
            SearchError::Selection(SelectionError::UnknownStation(code)) if !loaded => {
                info!(%code, "waiting for station directory");
                tokio::select! {
                    _ = tokio::time::sleep(STATION_RETRY_INTERVAL) => {}
                    _ = tokio::signal::ctrl_c() => return,
                }
            }
            // Selection is stored; the refresh task retries
            SearchError::Feed { .. } => {
                error!(error = %e, "initial search failed");
                break;
            }
            _ => {
                error!(error = %e, "invalid station selection");
                return;
            }
        }
    }

    engine.start_refresh();

    loop {
        let board = updates.borrow_and_update().clone();
        if let Some(board) = board {
            print_board(&engine, &board).await;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.stop_refresh();
}

async fn print_board<S: TrainSource>(engine: &QueryEngine<S>, board: &QueryResult) {
    let directory = engine.directory();
    let from = directory.lookup(&board.reference).await;
    let title = match &board.destination {
        Some(dest) => format!("{} → {}", from, directory.lookup(dest).await),
        None => from,
    };

    println!();
    println!("{}  (updated {})", title, format_clock(board.received_at));
    println!("{:-<64}", "");

    if board.is_empty() {
        println!("No trains.");
        return;
    }

    let next = board.next_departure(Utc::now());

    for (i, train) in board.trains.iter().enumerate() {
        let marker = if Some(i) == next { ">" } else { " " };
        let scheduled = train
            .scheduled_time()
            .map(format_clock)
            .unwrap_or_default();
        let effective = train
            .effective_time()
            .map(format_clock)
            .unwrap_or_default();
        let delay = train.delay().map(|d| d.to_string()).unwrap_or_default();
        let track = train.track().unwrap_or("");
        let terminus = match train.destination_row() {
            Some(row) => directory.lookup(&row.station).await,
            None => String::new(),
        };
        let status = if train.cancelled { "cancelled" } else { "" };

        println!(
            "{marker} {scheduled:>8} {effective:>8} {delay:>8} {track:>3}  {label:<5} {terminus} {status}",
            label = train.label(),
        );
    }
}
