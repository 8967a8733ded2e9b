//! Canonical encoders for the server-list records
//!
//! The stream itself is read-only for this crate, but canonical encodings are
//! needed to build fixtures and to check that every schema field decodes.

use crate::frame::LENGTH_PREFIX_SIZE;
use crate::records::{decode_player, decode_server_data, decode_server_info};
use crate::varint::{varint_len, write_varint, write_varint64};
use crate::wire::WireType;
use bytes::{BufMut, Bytes, BytesMut};
use fxlist_core::{Player, Result, ServerData, ServerInfo};

/// Trait for records that map onto one wire message
pub trait WireMessage: Sized {
    fn encode(&self, buf: &mut BytesMut);
    fn decode(bytes: &[u8]) -> Result<Self>;

    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

#[inline]
pub fn write_tag(buf: &mut BytesMut, field: u32, wire_type: WireType) {
    write_varint(buf, (field << 3) | wire_type as u32);
}

#[inline]
pub fn write_varint_field(buf: &mut BytesMut, field: u32, val: u32) {
    write_tag(buf, field, WireType::Varint);
    write_varint(buf, val);
}

#[inline]
pub fn write_bool_field(buf: &mut BytesMut, field: u32, val: bool) {
    write_tag(buf, field, WireType::Varint);
    write_varint64(buf, val as u64);
}

#[inline]
pub fn write_bytes_field(buf: &mut BytesMut, field: u32, bytes: &[u8]) {
    let tag = (field << 3) | WireType::LengthDelimited as u32;
    buf.reserve(varint_len(tag as u64) + varint_len(bytes.len() as u64) + bytes.len());
    write_varint(buf, tag);
    write_varint(buf, bytes.len() as u32);
    buf.put_slice(bytes);
}

#[inline]
pub fn write_string_field(buf: &mut BytesMut, field: u32, val: &str) {
    write_bytes_field(buf, field, val.as_bytes());
}

/// Wrap a payload in the outer `[u32 LE length]` prefix
pub fn encode_frame(payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    buf
}

fn write_opt_string(buf: &mut BytesMut, field: u32, val: &Option<String>) {
    if let Some(val) = val {
        write_string_field(buf, field, val);
    }
}

fn write_opt_varint(buf: &mut BytesMut, field: u32, val: Option<u32>) {
    if let Some(val) = val {
        write_varint_field(buf, field, val);
    }
}

impl WireMessage for Player {
    fn encode(&self, buf: &mut BytesMut) {
        write_opt_string(buf, 1, &self.name);
        for identifier in &self.identifiers {
            write_string_field(buf, 2, identifier);
        }
        write_opt_string(buf, 3, &self.endpoint);
        write_opt_varint(buf, 4, self.ping);
        write_opt_varint(buf, 5, self.id);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_player(bytes)
    }
}

impl WireMessage for ServerData {
    fn encode(&self, buf: &mut BytesMut) {
        // Zero counts are implied by absence
        if self.max_slots != 0 {
            write_varint_field(buf, 1, self.max_slots);
        }
        if self.clients != 0 {
            write_varint_field(buf, 2, self.clients);
        }
        write_opt_varint(buf, 3, self.protocol);
        write_opt_string(buf, 4, &self.hostname);
        write_opt_string(buf, 5, &self.gametype);
        write_opt_string(buf, 6, &self.mapname);
        for resource in &self.resources {
            write_string_field(buf, 8, resource);
        }
        write_opt_string(buf, 9, &self.server);

        let mut nested = BytesMut::new();
        for player in &self.players {
            nested.clear();
            player.encode(&mut nested);
            write_bytes_field(buf, 10, &nested);
        }

        write_opt_varint(buf, 11, self.icon_version);

        // Sorted so the encoding is deterministic
        let mut vars: Vec<_> = self.vars.iter().collect();
        vars.sort();
        for (key, value) in vars {
            nested.clear();
            write_string_field(&mut nested, 1, key);
            write_string_field(&mut nested, 2, value);
            write_bytes_field(buf, 12, &nested);
        }

        if let Some(enhanced) = self.enhanced_host_support {
            write_bool_field(buf, 16, enhanced);
        }
        write_opt_varint(buf, 17, self.upvote_power);
        for endpoint in &self.connect_end_points {
            write_string_field(buf, 18, endpoint);
        }
        write_opt_varint(buf, 19, self.burst_power);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_server_data(bytes)
    }
}

impl WireMessage for ServerInfo {
    fn encode(&self, buf: &mut BytesMut) {
        write_opt_string(buf, 1, &self.endpoint);
        if let Some(data) = &self.data {
            let mut nested = BytesMut::new();
            data.encode(&mut nested);
            write_bytes_field(buf, 2, &nested);
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_server_info(bytes)
    }
}
