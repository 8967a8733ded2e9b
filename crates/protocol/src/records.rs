//! Server-list record decoding
//!
//! The schema is fixed: each decoder walks the message tag by tag and
//! dispatches on the field number. Numbers outside the table are skipped by
//! wire type, so newer servers adding fields never break older readers.
//!
//! # Field Tables
//!
//! | Record       | Field | Name                  | Encoding              |
//! |--------------|-------|-----------------------|-----------------------|
//! | `Player`     | 1     | name                  | string                |
//! |              | 2     | identifiers           | string, repeated      |
//! |              | 3     | endpoint              | string                |
//! |              | 4     | ping                  | varint                |
//! |              | 5     | id                    | varint                |
//! | `ServerData` | 1     | max_slots             | varint                |
//! |              | 2     | clients               | varint                |
//! |              | 3     | protocol              | varint                |
//! |              | 4     | hostname              | string                |
//! |              | 5     | gametype              | string                |
//! |              | 6     | mapname               | string                |
//! |              | 8     | resources             | string, repeated      |
//! |              | 9     | server                | string                |
//! |              | 10    | players               | `Player`, repeated    |
//! |              | 11    | icon_version          | varint                |
//! |              | 12    | vars                  | map entry, repeated   |
//! |              | 16    | enhanced_host_support | bool                  |
//! |              | 17    | upvote_power          | varint                |
//! |              | 18    | connect_end_points    | string, repeated      |
//! |              | 19    | burst_power           | varint                |
//! | `ServerInfo` | 1     | endpoint              | string                |
//! |              | 2     | data                  | `ServerData`          |
//!
//! Values are read according to the table regardless of the wire type in the
//! tag; the wire type only matters for skipping unknown fields.

use crate::wire::WireReader;
use fxlist_core::{Player, Result, ServerData, ServerInfo};
use tracing::trace;

/// Decode a `Player` message
pub fn decode_player(bytes: &[u8]) -> Result<Player> {
    let mut reader = WireReader::new(bytes);
    let mut player = Player::default();

    while !reader.is_at_end() {
        let (field, wire_type) = reader.read_tag()?;

        match field {
            1 => player.name = Some(reader.read_string()?),
            2 => player.identifiers.push(reader.read_string()?),
            3 => player.endpoint = Some(reader.read_string()?),
            4 => player.ping = Some(reader.read_varint()?),
            5 => player.id = Some(reader.read_varint()?),
            _ => skip_unknown(&mut reader, "Player", field, wire_type)?,
        }
    }

    Ok(player)
}

/// Decode a `ServerData` message
///
/// `max_slots` and `clients` are 0 when absent; every other scalar stays `None`.
pub fn decode_server_data(bytes: &[u8]) -> Result<ServerData> {
    let mut reader = WireReader::new(bytes);
    let mut data = ServerData::default();

    while !reader.is_at_end() {
        let (field, wire_type) = reader.read_tag()?;

        match field {
            1 => data.max_slots = reader.read_varint()?,
            2 => data.clients = reader.read_varint()?,
            3 => data.protocol = Some(reader.read_varint()?),
            4 => data.hostname = Some(reader.read_string()?),
            5 => data.gametype = Some(reader.read_string()?),
            6 => data.mapname = Some(reader.read_string()?),
            8 => data.resources.push(reader.read_string()?),
            9 => data.server = Some(reader.read_string()?),
            10 => {
                let player = decode_player(reader.read_bytes()?)?;
                data.players.push(player);
            }
            11 => data.icon_version = Some(reader.read_varint()?),
            12 => {
                let (key, value) = decode_var_entry(reader.read_bytes()?)?;
                data.vars.insert(key, value);
            }
            16 => data.enhanced_host_support = Some(reader.read_bool()?),
            17 => data.upvote_power = Some(reader.read_varint()?),
            18 => data.connect_end_points.push(reader.read_string()?),
            19 => data.burst_power = Some(reader.read_varint()?),
            _ => skip_unknown(&mut reader, "ServerData", field, wire_type)?,
        }
    }

    Ok(data)
}

/// Decode a `ServerInfo` message, the payload of one stream frame
pub fn decode_server_info(bytes: &[u8]) -> Result<ServerInfo> {
    let mut reader = WireReader::new(bytes);
    let mut info = ServerInfo::default();

    while !reader.is_at_end() {
        let (field, wire_type) = reader.read_tag()?;

        match field {
            1 => info.endpoint = Some(reader.read_string()?),
            2 => info.data = Some(decode_server_data(reader.read_bytes()?)?),
            _ => skip_unknown(&mut reader, "ServerInfo", field, wire_type)?,
        }
    }

    Ok(info)
}

/// Decode one `vars` map entry (1 = key, 2 = value)
///
/// A missing key or value decodes as an empty string.
fn decode_var_entry(bytes: &[u8]) -> Result<(String, String)> {
    let mut reader = WireReader::new(bytes);
    let mut key = String::new();
    let mut value = String::new();

    while !reader.is_at_end() {
        let (field, wire_type) = reader.read_tag()?;

        match field {
            1 => key = reader.read_string()?,
            2 => value = reader.read_string()?,
            _ => skip_unknown(&mut reader, "vars entry", field, wire_type)?,
        }
    }

    Ok((key, value))
}

#[inline]
fn skip_unknown(reader: &mut WireReader<'_>, message: &str, field: u32, wire_type: u8) -> Result<()> {
    trace!("Skipping unknown {} field {} (wire type {})", message, field, wire_type);
    reader.skip_field(wire_type)
}
