//! Decoded server-list record types
//!
//! Every record is built whole by one decode call and never mutated afterwards.
//! Optional fields stay `None` when the field never appeared on the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A player entry embedded in [`ServerData`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: Option<String>,

    /// Platform identifiers (`license:...`, `steam:...`), in wire order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,

    pub endpoint: Option<String>,
    pub ping: Option<u32>,
    pub id: Option<u32>,
}

/// Live state of one game server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerData {
    /// Slot count, 0 when the server never reported it
    pub max_slots: u32,

    /// Connected client count, 0 when the server never reported it
    pub clients: u32,

    pub protocol: Option<u32>,
    pub hostname: Option<String>,
    pub gametype: Option<String>,
    pub mapname: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Server build string, e.g. `FXServer-master SERVER v1.0.0.7290 win32`
    pub server: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<Player>,

    pub icon_version: Option<u32>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vars: HashMap<String, String>,

    pub enhanced_host_support: Option<bool>,
    pub upvote_power: Option<u32>,
    pub burst_power: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connect_end_points: Vec<String>,
}

impl ServerData {
    /// Look up a server variable such as `locale` or `sv_projectName`
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// One stream record: a server endpoint and its data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub endpoint: Option<String>,
    pub data: Option<ServerData>,
}

impl ServerInfo {
    /// A record is only useful to consumers when both halves are present
    pub fn is_complete(&self) -> bool {
        self.endpoint.is_some() && self.data.is_some()
    }
}
