//! # fxlist Server Statistics
//!
//! Aggregates a batch of decoded servers into a [`ServerStats`] overview:
//! population totals and popularity tables for game types, maps, server
//! builds, protocol versions, operating systems and resources.
//!
//! ```rust
//! use fxlist_analysis::ServerAnalyzer;
//! use fxlist_core::{ServerData, ServerInfo};
//!
//! let mut analyzer = ServerAnalyzer::new();
//! analyzer.add_server(ServerInfo {
//!     endpoint: Some("abc123".into()),
//!     data: Some(ServerData { clients: 10, max_slots: 48, ..Default::default() }),
//! });
//!
//! let stats = analyzer.analyze();
//! assert_eq!(stats.total_players, 10);
//! ```

mod os;

pub use os::{os_from_server, OsFamily};

use fxlist_core::ServerInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// One row of a popularity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub total_resources: usize,
    pub average_resources_per_server: f64,
    pub popular_resources: Vec<CountEntry>,
}

/// Overview of a batch of servers
///
/// Every table is sorted by count, highest first, with ties broken by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub total_servers: usize,
    pub total_players: u64,
    pub total_max_slots: u64,
    pub average_population: f64,
    pub popular_game_types: Vec<CountEntry>,
    pub popular_maps: Vec<CountEntry>,
    pub server_versions: Vec<CountEntry>,
    pub protocol_versions: Vec<CountEntry>,
    pub operating_systems: Vec<CountEntry>,
    pub resource_usage: ResourceUsage,
}

impl ServerStats {
    /// Log the overview, showing at most `top` rows per table
    pub fn display(&self, top: usize) {
        info!("Server overview:");
        info!("  Servers: {}", self.total_servers);
        info!("  Players: {} / {} slots", self.total_players, self.total_max_slots);
        info!("  Average population: {:.2}", self.average_population);
        display_table("Game types", &self.popular_game_types, top);
        display_table("Maps", &self.popular_maps, top);
        display_table("Server versions", &self.server_versions, top);
        display_table("Protocol versions", &self.protocol_versions, top);
        display_table("Operating systems", &self.operating_systems, top);
        info!(
            "  Resources: {} total, {:.2} per server",
            self.resource_usage.total_resources, self.resource_usage.average_resources_per_server
        );
        display_table("Resources", &self.resource_usage.popular_resources, top);
    }
}

fn display_table(title: &str, entries: &[CountEntry], top: usize) {
    if entries.is_empty() {
        return;
    }
    info!("  {}:", title);
    for entry in entries.iter().take(top) {
        info!("    {:<40} {}", entry.key, entry.count);
    }
}

/// Collects servers and computes [`ServerStats`] on demand
#[derive(Debug, Default)]
pub struct ServerAnalyzer {
    servers: Vec<ServerInfo>,
}

impl ServerAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one server; servers missing an endpoint or data are ignored
    pub fn add_server(&mut self, server: ServerInfo) {
        if server.is_complete() {
            self.servers.push(server);
        } else {
            debug!("Ignoring incomplete server record");
        }
    }

    pub fn add_servers<I>(&mut self, servers: I)
    where
        I: IntoIterator<Item = ServerInfo>,
    {
        for server in servers {
            self.add_server(server);
        }
    }

    pub fn clear(&mut self) {
        self.servers.clear();
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn analyze(&self) -> ServerStats {
        let mut game_types = Counter::default();
        let mut maps = Counter::default();
        let mut versions = Counter::default();
        let mut protocols = Counter::default();
        let mut systems = Counter::default();
        let mut resources = Counter::default();

        let mut total_players = 0u64;
        let mut total_max_slots = 0u64;
        let mut total_resources = 0usize;

        for data in self.servers.iter().filter_map(|s| s.data.as_ref()) {
            total_players += data.clients as u64;
            total_max_slots += data.max_slots as u64;

            game_types.add_nonempty(data.gametype.as_deref());
            maps.add_nonempty(data.mapname.as_deref());
            versions.add_nonempty(data.server.as_deref());

            // Protocol 0 means unreported
            if let Some(protocol) = data.protocol.filter(|p| *p != 0) {
                protocols.add(&protocol.to_string());
            }

            systems.add(os_from_server(data.server.as_deref().unwrap_or("")).as_str());

            total_resources += data.resources.len();
            for resource in &data.resources {
                resources.add(resource);
            }
        }

        let count = self.servers.len();
        let per_server = |total: f64| if count > 0 { total / count as f64 } else { 0.0 };

        ServerStats {
            total_servers: count,
            total_players,
            total_max_slots,
            average_population: per_server(total_players as f64),
            popular_game_types: game_types.into_sorted(),
            popular_maps: maps.into_sorted(),
            server_versions: versions.into_sorted(),
            protocol_versions: protocols.into_sorted(),
            operating_systems: systems.into_sorted(),
            resource_usage: ResourceUsage {
                total_resources,
                average_resources_per_server: per_server(total_resources as f64),
                popular_resources: resources.into_sorted(),
            },
        }
    }
}

#[derive(Default)]
struct Counter(HashMap<String, usize>);

impl Counter {
    fn add(&mut self, key: &str) {
        *self.0.entry(key.to_string()).or_insert(0) += 1;
    }

    fn add_nonempty(&mut self, key: Option<&str>) {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            self.add(key);
        }
    }

    fn into_sorted(self) -> Vec<CountEntry> {
        let mut entries: Vec<_> = self
            .0
            .into_iter()
            .map(|(key, count)| CountEntry { key, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        entries
    }
}
