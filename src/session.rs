//! Live TV load cycles
//!
//! One cycle fetches both directories on background threads, waits for them
//! within a single time budget, resolves, and settles exactly once. A newer
//! cycle or a teardown cancels the previous cycle's token; such a cycle ends
//! silently. Only a timeout or a real fetch error substitutes the curated
//! catalog.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::api::{CancelToken, CatalogSource, IptvClient};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::fallback::{apply_fallback, fallback_catalog, Warning};
use crate::models::{Channel, ChannelEntry, Stream};
use crate::resolver::{resolve_with_stats, ResolveOptions};

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(10);

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Enough live channels
    Live,
    /// Some live channels, padded from the catalog
    Partial,
    /// Nothing live; catalog shown without a warning
    EmptyFallback,
    /// Budget elapsed; catalog shown
    TimedOut,
    /// A fetch failed; catalog shown
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Settlement {
    pub cycle: u64,
    pub entries: Vec<ChannelEntry>,
    pub warning: Option<Warning>,
    pub outcome: Outcome,
    pub settled_at: DateTime<Local>,
}

/// Phase of the session. The displayed list lives apart from it and only
/// changes when a cycle settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { cycle: u64, refreshing: bool },
    Settled { cycle: u64 },
}

/// Fetch worker messages
enum FetchResult {
    Channels(Result<Vec<Channel>, FetchError>),
    Streams(Result<Vec<Stream>, FetchError>),
}

/// A started cycle whose fetches are in flight
pub struct PendingCycle {
    cycle: u64,
    token: CancelToken,
    receiver: Receiver<FetchResult>,
    // None when the budget is too large to represent
    deadline: Option<Instant>,
    options: ResolveOptions,
    catalog: Arc<Vec<ChannelEntry>>,
}

impl PendingCycle {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Block until the cycle settles. `None` when it was cancelled from
    /// outside (superseded or torn down).
    pub fn wait(self) -> Option<Settlement> {
        let mut channels: Option<Vec<Channel>> = None;
        let mut streams: Option<Vec<Stream>> = None;

        while channels.is_none() || streams.is_none() {
            let received = match self.deadline {
                Some(deadline) => self
                    .receiver
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self.receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(FetchResult::Channels(Ok(list))) => channels = Some(list),
                Ok(FetchResult::Streams(Ok(list))) => streams = Some(list),
                Ok(FetchResult::Channels(Err(e))) | Ok(FetchResult::Streams(Err(e))) => {
                    return self.fail(e);
                }
                Err(RecvTimeoutError::Timeout) => return self.time_out(),
                Err(RecvTimeoutError::Disconnected) => {
                    return self.fail(FetchError::Transport("fetch worker exited".to_string()));
                }
            }
        }

        if self.token.is_cancelled() {
            debug!("Cycle {} superseded after fetch", self.cycle);
            return None;
        }

        let (channels, streams) = (channels.unwrap_or_default(), streams.unwrap_or_default());
        let (working, stats) = resolve_with_stats(&channels, &streams, &self.options);
        debug!(
            "Cycle {}: {} channels, {} streams, inspected {}, playable {}, matched {}",
            self.cycle,
            channels.len(),
            streams.len(),
            stats.inspected,
            stats.playable,
            stats.matched
        );

        let live_count = working.len();
        let (entries, warning) = apply_fallback(
            working,
            &self.catalog,
            self.options.target_count,
            self.options.minimum_count,
        );
        let outcome = match (live_count, warning) {
            (0, _) => Outcome::EmptyFallback,
            (_, Some(_)) => Outcome::Partial,
            _ => Outcome::Live,
        };
        if outcome == Outcome::EmptyFallback {
            warn!("Cycle {}: no playable live channels, showing curated list", self.cycle);
        }

        Some(self.settlement(entries, warning, outcome))
    }

    fn fail(self, error: FetchError) -> Option<Settlement> {
        if error.is_abort() || self.token.is_cancelled() {
            debug!("Cycle {} aborted", self.cycle);
            return None;
        }
        // Stop the sibling fetch, its result is no longer needed
        self.token.cancel();
        warn!("Failed to load IPTV channels: {}", error);
        let entries = self.catalog.to_vec();
        Some(self.settlement(entries, Some(Warning::LoadFailed), Outcome::Failed(error.to_string())))
    }

    fn time_out(self) -> Option<Settlement> {
        if self.token.is_cancelled() {
            return None;
        }
        self.token.cancel();
        warn!("Cycle {} exceeded its time budget, showing curated list", self.cycle);
        let entries = self.catalog.to_vec();
        Some(self.settlement(entries, Some(Warning::LoadFailed), Outcome::TimedOut))
    }

    fn settlement(&self, entries: Vec<ChannelEntry>, warning: Option<Warning>, outcome: Outcome) -> Settlement {
        Settlement {
            cycle: self.cycle,
            entries,
            warning,
            outcome,
            settled_at: Local::now(),
        }
    }
}

/// Holds the displayed channel list across load cycles
pub struct LiveTvSession<S: CatalogSource> {
    source: Arc<S>,
    options: ResolveOptions,
    time_budget: Duration,
    catalog: Arc<Vec<ChannelEntry>>,
    state: LoadState,
    displayed: Option<Settlement>,
    last_cycle: u64,
    in_flight: Option<CancelToken>,
}

impl LiveTvSession<IptvClient> {
    pub fn from_config(config: &AppConfig) -> Self {
        LiveTvSession::new(config.client())
            .with_options(config.resolve_options())
            .with_time_budget(config.time_budget())
    }
}

impl<S: CatalogSource> LiveTvSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            options: ResolveOptions::default(),
            time_budget: DEFAULT_TIME_BUDGET,
            catalog: Arc::new(fallback_catalog()),
            state: LoadState::Idle,
            displayed: None,
            last_cycle: 0,
            in_flight: None,
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<ChannelEntry>) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Last settled cycle; kept while a refresh is in flight
    pub fn settlement(&self) -> Option<&Settlement> {
        self.displayed.as_ref()
    }

    /// Currently displayed entries; empty until the first cycle settles
    pub fn entries(&self) -> &[ChannelEntry] {
        self.settlement().map(|s| s.entries.as_slice()).unwrap_or(&[])
    }

    pub fn warning(&self) -> Option<Warning> {
        self.settlement().and_then(|s| s.warning)
    }

    /// Start a new cycle, aborting any cycle still in flight
    pub fn begin(&mut self, refreshing: bool) -> PendingCycle {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }

        self.last_cycle += 1;
        let cycle = self.last_cycle;
        let token = CancelToken::new();
        self.in_flight = Some(token.clone());
        self.state = LoadState::Loading { cycle, refreshing };
        info!("Loading live channels (cycle {}{})", cycle, if refreshing { ", refresh" } else { "" });

        let (sender, receiver) = channel();
        {
            let source = Arc::clone(&self.source);
            let token = token.clone();
            let sender = sender.clone();
            thread::spawn(move || {
                let _ = sender.send(FetchResult::Channels(source.channels(&token)));
            });
        }
        {
            let source = Arc::clone(&self.source);
            let token = token.clone();
            thread::spawn(move || {
                let _ = sender.send(FetchResult::Streams(source.streams(&token)));
            });
        }

        PendingCycle {
            cycle,
            token,
            receiver,
            deadline: Instant::now().checked_add(self.time_budget),
            options: self.options,
            catalog: Arc::clone(&self.catalog),
        }
    }

    /// Apply a settled cycle. Returns false for a cycle that is no longer current.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        let current = matches!(self.state, LoadState::Loading { cycle, .. } if cycle == settlement.cycle);
        if !current {
            debug!("Dropping stale settlement from cycle {}", settlement.cycle);
            return false;
        }

        info!(
            "Cycle {} settled: {} channels ({:?})",
            settlement.cycle,
            settlement.entries.len(),
            settlement.outcome
        );
        self.in_flight = None;
        self.state = LoadState::Settled { cycle: settlement.cycle };
        self.displayed = Some(settlement);
        true
    }

    pub fn load(&mut self) -> Option<&Settlement> {
        self.run(false)
    }

    /// Pull-to-refresh: same as `load`, flagged as a refresh
    pub fn refresh(&mut self) -> Option<&Settlement> {
        self.run(true)
    }

    /// Abort whatever is in flight and go back to the last settled list
    pub fn teardown(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        if matches!(self.state, LoadState::Loading { .. }) {
            self.state = match &self.displayed {
                Some(settlement) => LoadState::Settled { cycle: settlement.cycle },
                None => LoadState::Idle,
            };
        }
    }

    fn run(&mut self, refreshing: bool) -> Option<&Settlement> {
        let pending = self.begin(refreshing);
        let settlement = pending.wait()?;
        if self.settle(settlement) {
            self.settlement()
        } else {
            None
        }
    }
}

impl<S: CatalogSource> Drop for LiveTvSession<S> {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}
