//! Live TV resolver - console front end
//!
//! Usage:
//!   livetv                    list resolved channels
//!   livetv play <n>           print the playback handoff for entry n (1-based)
//!   livetv streams <channel>  list the directory's streams for one channel

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::error::Error;

use livetv_resolver::{is_playable, AppConfig, CancelToken, ChannelEntry, LiveTvSession, Settlement};

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = AppConfig::load();

    let result = match args.first().map(String::as_str) {
        None | Some("list") => list_channels(&config),
        Some("play") => play_channel(&config, args.get(1).map(String::as_str)),
        Some("streams") => list_streams(&config, args.get(1).map(String::as_str).unwrap_or("")),
        Some(other) => Err(format!("Unknown command '{}' (expected list, play or streams)", other).into()),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load(config: &AppConfig) -> Result<Settlement, Box<dyn Error + Send + Sync>> {
    let mut session = LiveTvSession::from_config(config);
    session
        .load()
        .cloned()
        .ok_or_else(|| "Load cycle was cancelled".into())
}

fn list_channels(config: &AppConfig) -> CliResult {
    let settlement = load(config)?;

    if let Some(warning) = settlement.warning {
        println!("! {}", warning);
    }
    for (i, entry) in settlement.entries.iter().enumerate() {
        println!("{}", format_entry(i + 1, entry));
    }
    Ok(())
}

fn play_channel(config: &AppConfig, index: Option<&str>) -> CliResult {
    let index: usize = index
        .ok_or("Missing channel number")?
        .parse()
        .map_err(|_| "Channel number must be a positive integer")?;

    let settlement = load(config)?;
    let entry = index
        .checked_sub(1)
        .and_then(|i| settlement.entries.get(i))
        .ok_or_else(|| format!("No channel #{} ({} loaded)", index, settlement.entries.len()))?;

    let request = entry
        .playback_request(config.override_url())
        .ok_or_else(|| format!("Channel '{}' has no stream URL", entry.channel.name))?;

    log::info!("[PLAY] {} | URL: {}", sanitize_text(&entry.channel.name), request.video_uri);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn list_streams(config: &AppConfig, channel_id: &str) -> CliResult {
    if channel_id.is_empty() {
        return Err("Missing channel id".into());
    }

    let streams = config.client().fetch_channel_streams(channel_id, &CancelToken::new())?;
    if streams.is_empty() {
        println!("No streams listed for {}", channel_id);
    }
    for stream in &streams {
        let mark = if is_playable(stream) { "ok  " } else { "skip" };
        let status = stream.status.as_deref().unwrap_or("-");
        println!("[{}] {} ({})", mark, stream.url, status);
    }
    Ok(())
}

fn format_entry(number: usize, entry: &ChannelEntry) -> String {
    let channel = &entry.channel;
    let subtitle = channel.subtitle();
    let mut line = format!(
        "{:>2}. {} [{} | {}]",
        number,
        sanitize_text(&channel.name),
        channel.country_label(),
        channel.category_label()
    );
    if !subtitle.is_empty() {
        line.push_str(" - ");
        line.push_str(&subtitle);
    }
    line
}

// Directory names sometimes carry control characters
fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}
