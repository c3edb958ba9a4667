//! Curated fallback channels and the degradation policy

use std::collections::HashSet;
use std::fmt;

use crate::models::{Channel, ChannelEntry, Stream};

/// Advisory shown next to a usable (possibly substituted) channel list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Live resolution found some channels, but fewer than the minimum
    FewChannels,
    /// Live data failed or timed out; the curated list is shown instead
    LoadFailed,
}

impl Warning {
    pub fn message(&self) -> &'static str {
        match self {
            Warning::FewChannels => "Only a few live channels are available right now.",
            Warning::LoadFailed => "Live channels could not be loaded. Showing featured channels instead.",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// (id, name, country, category, logo, url)
const CURATED: &[(&str, &str, &str, &str, Option<&str>, &str)] = &[
    (
        "fallback-li-live",
        "Li Live",
        "US",
        "general",
        None,
        "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
    ),
    (
        "fallback-nasa",
        "NASA Live",
        "US",
        "science",
        Some("https://upload.wikimedia.org/wikipedia/commons/e/e5/NASA_logo.svg"),
        "https://ntv1.akamaized.net/hls/live/2014075/NASA-NTV1-Public/master.m3u8",
    ),
    (
        "fallback-redbull",
        "Red Bull TV",
        "US",
        "sports",
        Some("https://static.redbull.com/assets/redbulltv/redbulltv-logo.png"),
        "https://rbmn-live.akamaized.net/hls/live/590964/BoRB-AT/master_3360.m3u8",
    ),
    (
        "fallback-pluto-news",
        "Pluto News",
        "US",
        "news",
        None,
        "https://service-stitcher.clusters.pluto.tv/v1/stitch/embed/hls/channel/5ca672e8738d0421e15aabff/master.m3u8?deviceId=web&deviceMake=web&deviceModel=web",
    ),
    (
        "fallback-dw",
        "DW English",
        "DE",
        "news",
        Some("https://upload.wikimedia.org/wikipedia/commons/0/07/Deutsche_Welle_symbol_2012.svg"),
        "https://dwamdstream102.akamaized.net/hls/live/2015525/dwstream102/index.m3u8",
    ),
    (
        "fallback-bloomberg",
        "Bloomberg Quicktake",
        "US",
        "business",
        None,
        "https://d1e7h2jnv8ied5.cloudfront.net/out/v1/61c0b4b0a49e4a87908c4acdaa0a5f19/index.m3u8",
    ),
    (
        "fallback-lofi",
        "LoFi Chill Radio",
        "INT",
        "music",
        None,
        "https://cdn2.justcast.com/codergmetal_1/playlist.m3u8",
    ),
    (
        "fallback-bbc-learning",
        "Learning English",
        "UK",
        "education",
        None,
        "https://llnw.live.bbc.co.uk/s1/live/bbc_news_uk/bbc_news_uk.isml/manifest.m3u8",
    ),
    (
        "fallback-travelxp",
        "Travel XP",
        "IN",
        "travel",
        None,
        "https://dai.google.com/linear/hls/event/ySpknsClS2O8QzrU5cLspQ/master.m3u8",
    ),
    (
        "fallback-caribbean",
        "Caribbean Hot",
        "DO",
        "music",
        None,
        "https://wowzaprod246-i.akamaihd.net/hls/live/1010938/9ce3fa35/playlist.m3u8",
    ),
];

/// The curated channel list. Always available and never re-validated.
pub fn fallback_catalog() -> Vec<ChannelEntry> {
    CURATED
        .iter()
        .map(|&(id, name, country, category, logo, url)| ChannelEntry {
            channel: Channel {
                id: id.to_string(),
                name: name.to_string(),
                logo: logo.map(str::to_string),
                country: Some(country.to_string()),
                subdivision: None,
                city: None,
                categories: vec![category.to_string()],
                languages: Vec::new(),
                broadcast_area: None,
                website: None,
                is_adult_content: false,
            },
            stream: Stream::new(id, url),
        })
        .collect()
}

/// Decide what to show for a live resolution result.
///
/// - nothing live: the whole catalog, no warning (full outage, not partial)
/// - fewer than `minimum_count`: live entries padded from the catalog up to
///   `target_count`, with `Warning::FewChannels`
/// - otherwise the live entries unchanged
pub fn apply_fallback(
    working: Vec<ChannelEntry>,
    catalog: &[ChannelEntry],
    target_count: usize,
    minimum_count: usize,
) -> (Vec<ChannelEntry>, Option<Warning>) {
    if working.is_empty() {
        return (catalog.to_vec(), None);
    }
    if working.len() >= minimum_count {
        return (working, None);
    }

    let mut seen: HashSet<String> = working.iter().map(|e| e.channel.id.clone()).collect();
    let mut entries = working;
    for entry in catalog {
        if entries.len() >= target_count {
            break;
        }
        if seen.insert(entry.channel.id.clone()) {
            entries.push(entry.clone());
        }
    }

    (entries, Some(Warning::FewChannels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::is_playable;

    fn live(id: &str) -> ChannelEntry {
        let mut entry = fallback_catalog().remove(0);
        entry.channel.id = id.to_string();
        entry.stream.channel = id.to_string();
        entry
    }

    #[test]
    fn test_catalog_shape() {
        let catalog = fallback_catalog();
        assert_eq!(catalog.len(), 10);
        let ids: HashSet<&str> = catalog.iter().map(|e| e.channel.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().all(|e| e.channel.id.starts_with("fallback-")));
        assert!(catalog.iter().all(|e| e.stream.channel == e.channel.id));
        assert!(catalog.iter().all(|e| is_playable(&e.stream)));
    }

    #[test]
    fn test_empty_live_uses_catalog_without_warning() {
        let catalog = fallback_catalog();
        let (entries, warning) = apply_fallback(Vec::new(), &catalog, 18, 10);
        assert_eq!(entries, catalog);
        assert_eq!(warning, None);
    }

    #[test]
    fn test_partial_live_is_padded() {
        let catalog = fallback_catalog();
        let working = vec![live("a"), live("b"), live("c")];

        let (entries, warning) = apply_fallback(working, &catalog, 18, 10);

        assert_eq!(entries.len(), (3 + catalog.len()).min(18));
        assert_eq!(warning, Some(Warning::FewChannels));
        assert_eq!(entries[0].channel.id, "a");
        assert_eq!(entries[3].channel.id, "fallback-li-live");
    }

    #[test]
    fn test_padding_respects_target() {
        let catalog = fallback_catalog();
        let working: Vec<ChannelEntry> = (0..9).map(|i| live(&format!("live-{}", i))).collect();

        let (entries, _) = apply_fallback(working, &catalog, 12, 10);
        assert_eq!(entries.len(), 12);
    }

    #[test]
    fn test_padding_skips_ids_already_present() {
        let catalog = fallback_catalog();
        let working = vec![live("fallback-nasa")];

        let (entries, _) = apply_fallback(working, &catalog, 18, 10);

        let nasa = entries.iter().filter(|e| e.channel.id == "fallback-nasa").count();
        assert_eq!(nasa, 1);
        assert_eq!(entries.len(), catalog.len());
    }

    #[test]
    fn test_enough_live_unchanged() {
        let catalog = fallback_catalog();
        let working: Vec<ChannelEntry> = (0..10).map(|i| live(&format!("live-{}", i))).collect();

        let (entries, warning) = apply_fallback(working.clone(), &catalog, 18, 10);
        assert_eq!(entries, working);
        assert!(warning.is_none());
    }
}
