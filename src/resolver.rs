//! Join the stream directory onto the channel directory

use std::collections::{HashMap, HashSet};

use crate::classifier::is_playable;
use crate::models::{Channel, ChannelEntry, Stream};

pub const DEFAULT_TARGET_COUNT: usize = 18;
pub const DEFAULT_MINIMUM_COUNT: usize = 10;
pub const DEFAULT_MAX_STREAMS_SCANNED: usize = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Hard cap on the number of entries returned
    pub target_count: usize,
    /// Below this many entries the result is padded from the fallback catalog
    pub minimum_count: usize,
    /// Once this many streams were inspected and `minimum_count` is met, stop
    pub max_streams_scanned: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            minimum_count: DEFAULT_MINIMUM_COUNT,
            max_streams_scanned: DEFAULT_MAX_STREAMS_SCANNED,
        }
    }
}

/// Counters from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub inspected: usize,
    pub playable: usize,
    pub matched: usize,
}

pub fn resolve(channels: &[Channel], streams: &[Stream], options: &ResolveOptions) -> Vec<ChannelEntry> {
    resolve_with_stats(channels, streams, options).0
}

/// Walk `streams` in upstream order and keep the first playable stream of
/// each known, non-adult channel.
///
/// Output order is discovery order. At most one entry per channel id and at
/// most `target_count` entries.
pub fn resolve_with_stats(
    channels: &[Channel],
    streams: &[Stream],
    options: &ResolveOptions,
) -> (Vec<ChannelEntry>, ResolveStats) {
    // Duplicate ids: last one wins
    let channel_map: HashMap<&str, &Channel> =
        channels.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut working: Vec<ChannelEntry> = Vec::with_capacity(options.target_count);
    let mut used_ids: HashSet<&str> = HashSet::new();
    let mut stats = ResolveStats::default();

    for stream in streams {
        stats.inspected += 1;
        if !is_playable(stream) {
            continue;
        }
        stats.playable += 1;
        if working.len() >= options.target_count {
            break;
        }

        let channel = match channel_map.get(stream.channel.as_str()) {
            Some(channel) => *channel,
            None => continue,
        };
        if channel.is_adult_content || used_ids.contains(channel.id.as_str()) {
            continue;
        }

        working.push(ChannelEntry {
            channel: channel.clone(),
            stream: stream.clone(),
        });
        used_ids.insert(channel.id.as_str());

        if stats.inspected >= options.max_streams_scanned && working.len() >= options.minimum_count {
            break;
        }
    }

    stats.matched = working.len();
    (working, stats)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
