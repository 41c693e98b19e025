//! I2NP message kinds
//!
//! One constructor and one parser per message kind. Constructors return a
//! ready-to-send envelope with the long header filled in; parsers yield a
//! typed payload or a decode error, never a partial result.

use rand::random;

use super::tunnel_build::{parse_tunnel_build, parse_variable_tunnel_build};
use super::{
    Compression, IdentHash, Message, I2NP_MESSAGE_EXPIRATION_TIMEOUT_MS, TUNNEL_BUILD_RECORD_SIZE,
};
use crate::error::{Error, Result};
use crate::time;

/// DatabaseLookup flag: a reply tunnel ID follows the flags byte.
pub const DATABASE_LOOKUP_DELIVERY_FLAG: u8 = 0x01;
/// DatabaseLookup flag: a 32-byte reply encryption tag trails the message.
pub const DATABASE_LOOKUP_ENCRYPTION_FLAG: u8 = 0x02;
/// DatabaseLookup flag: exploratory lookup rather than a direct one.
pub const DATABASE_LOOKUP_EXPLORATORY_FLAG: u8 = 0x04;

// DatabaseStore: key(32) | type(1) | replyToken(4) [| tunnelID(4) | gateway(32)]
pub const DATABASE_STORE_KEY_OFFSET: usize = 0;
pub const DATABASE_STORE_TYPE_OFFSET: usize = DATABASE_STORE_KEY_OFFSET + 32;
pub const DATABASE_STORE_REPLY_TOKEN_OFFSET: usize = DATABASE_STORE_TYPE_OFFSET + 1;
pub const DATABASE_STORE_HEADER_SIZE: usize = DATABASE_STORE_REPLY_TOKEN_OFFSET + 4;

// DeliveryStatus: msgID(4) | timestamp(8)
pub const DELIVERY_STATUS_MSGID_OFFSET: usize = 0;
pub const DELIVERY_STATUS_TIMESTAMP_OFFSET: usize = DELIVERY_STATUS_MSGID_OFFSET + 4;
pub const DELIVERY_STATUS_SIZE: usize = DELIVERY_STATUS_TIMESTAMP_OFFSET + 8;

// TunnelGateway sub-header: tunnelID(4) | length(2)
pub const TUNNEL_GATEWAY_HEADER_TUNNELID_OFFSET: usize = 0;
pub const TUNNEL_GATEWAY_HEADER_LENGTH_OFFSET: usize = TUNNEL_GATEWAY_HEADER_TUNNELID_OFFSET + 4;
pub const TUNNEL_GATEWAY_HEADER_SIZE: usize = TUNNEL_GATEWAY_HEADER_LENGTH_OFFSET + 2;

// TunnelData: tunnelID(4) | 1024 opaque encrypted bytes
pub const TUNNEL_DATA_MSG_SIZE: usize = 1028;
pub const TUNNEL_DATA_ENCRYPTED_SIZE: usize = TUNNEL_DATA_MSG_SIZE - 4;

/// Message type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    DatabaseStore = 1,
    DatabaseLookup = 2,
    DatabaseSearchReply = 3,
    DeliveryStatus = 10,
    Garlic = 11,
    TunnelData = 18,
    TunnelGateway = 19,
    Data = 20,
    TunnelBuild = 21,
    TunnelBuildReply = 22,
    VariableTunnelBuild = 23,
    VariableTunnelBuildReply = 24,
}

impl MessageType {
    /// Parse type tag from byte
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(MessageType::DatabaseStore),
            2 => Some(MessageType::DatabaseLookup),
            3 => Some(MessageType::DatabaseSearchReply),
            10 => Some(MessageType::DeliveryStatus),
            11 => Some(MessageType::Garlic),
            18 => Some(MessageType::TunnelData),
            19 => Some(MessageType::TunnelGateway),
            20 => Some(MessageType::Data),
            21 => Some(MessageType::TunnelBuild),
            22 => Some(MessageType::TunnelBuildReply),
            23 => Some(MessageType::VariableTunnelBuild),
            24 => Some(MessageType::VariableTunnelBuildReply),
            _ => None,
        }
    }
}

/// Fill the long header of a freshly built message.
///
/// The message ID is the reply ID when answering, random otherwise; the
/// expiration horizon is a few seconds out. Size and checksum are
/// recomputed from the current payload.
pub fn fill_header(msg: &mut Message, msg_type: MessageType, reply_msg_id: u32) {
    msg.set_type_id(msg_type as u8);
    msg.set_msg_id(if reply_msg_id != 0 {
        reply_msg_id
    } else {
        random()
    });
    msg.set_expiration(time::millis_since_epoch() + I2NP_MESSAGE_EXPIRATION_TIMEOUT_MS);
    msg.update_size();
    msg.update_checksum();
}

/// Refresh message ID and expiration before retransmitting an already
/// built message.
pub fn renew_header(msg: &mut Message) {
    msg.set_msg_id(random());
    msg.set_expiration(time::millis_since_epoch() + I2NP_MESSAGE_EXPIRATION_TIMEOUT_MS);
    msg.update_checksum();
}

/// Generic constructor: wrap `payload` in an envelope of the given kind.
pub fn create_message(msg_type: MessageType, payload: &[u8], reply_msg_id: u32) -> Message {
    let mut msg = Message::with_capacity(payload.len());
    msg.fill_payload(payload);
    fill_header(&mut msg, msg_type, reply_msg_id);
    msg
}

// ----- DeliveryStatus -----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub msg_id: u32,
    /// Milliseconds since the epoch
    pub timestamp: u64,
}

pub fn create_delivery_status_msg(msg_id: u32) -> Message {
    let mut payload = [0u8; DELIVERY_STATUS_SIZE];
    payload[DELIVERY_STATUS_MSGID_OFFSET..DELIVERY_STATUS_MSGID_OFFSET + 4]
        .copy_from_slice(&msg_id.to_be_bytes());
    payload[DELIVERY_STATUS_TIMESTAMP_OFFSET..DELIVERY_STATUS_TIMESTAMP_OFFSET + 8]
        .copy_from_slice(&time::millis_since_epoch().to_be_bytes());
    create_message(MessageType::DeliveryStatus, &payload, 0)
}

fn parse_delivery_status(payload: &[u8]) -> Result<DeliveryStatus> {
    if payload.len() < DELIVERY_STATUS_SIZE {
        return Err(Error::truncated(DELIVERY_STATUS_SIZE, payload.len()));
    }
    Ok(DeliveryStatus {
        msg_id: u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
        timestamp: u64::from_be_bytes([
            payload[4], payload[5], payload[6], payload[7], payload[8], payload[9], payload[10],
            payload[11],
        ]),
    })
}

// ----- DatabaseStore -----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DatabaseStoreType {
    /// Gzip-compressed RouterInfo with a 2-byte length prefix
    RouterInfo = 0,
    /// Raw LeaseSet record
    LeaseSet = 1,
}

/// Reply tunnel and gateway accompanying a nonzero reply token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyPath {
    pub tunnel_id: u32,
    pub gateway: IdentHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStore {
    pub key: IdentHash,
    pub store_type: DatabaseStoreType,
    pub reply_token: u32,
    pub reply: Option<ReplyPath>,
    /// The embedded record: still gzip-compressed for RouterInfo (callers
    /// decompress through their [`Compression`] collaborator), raw for
    /// LeaseSet.
    pub data: Vec<u8>,
}

pub fn create_database_store_router_info_msg(
    key: &IdentHash,
    router_info: &[u8],
    compression: &dyn Compression,
) -> Result<Message> {
    let compressed = compression.compress(router_info)?;
    if compressed.len() > u16::MAX as usize {
        return Err(Error::InvalidField(format!(
            "compressed RouterInfo too large: {} bytes",
            compressed.len()
        )));
    }

    let mut payload = Vec::with_capacity(DATABASE_STORE_HEADER_SIZE + 2 + compressed.len());
    payload.extend_from_slice(key.as_bytes());
    payload.push(DatabaseStoreType::RouterInfo as u8);
    payload.extend_from_slice(&0u32.to_be_bytes()); // no reply expected
    payload.extend_from_slice(&(compressed.len() as u16).to_be_bytes());
    payload.extend_from_slice(&compressed);
    Ok(create_message(MessageType::DatabaseStore, &payload, 0))
}

pub fn create_database_store_lease_set_msg(
    key: &IdentHash,
    lease_set: &[u8],
    reply_token: u32,
    reply: Option<ReplyPath>,
) -> Result<Message> {
    if reply_token != 0 && reply.is_none() {
        return Err(Error::InvalidField(
            "reply token set without a reply path".into(),
        ));
    }

    let mut payload = Vec::with_capacity(DATABASE_STORE_HEADER_SIZE + 36 + lease_set.len());
    payload.extend_from_slice(key.as_bytes());
    payload.push(DatabaseStoreType::LeaseSet as u8);
    payload.extend_from_slice(&reply_token.to_be_bytes());
    if reply_token != 0 {
        // reply.is_some() checked above
        if let Some(path) = reply {
            payload.extend_from_slice(&path.tunnel_id.to_be_bytes());
            payload.extend_from_slice(path.gateway.as_bytes());
        }
    }
    payload.extend_from_slice(lease_set);
    Ok(create_message(MessageType::DatabaseStore, &payload, 0))
}

fn parse_database_store(payload: &[u8]) -> Result<DatabaseStore> {
    if payload.len() < DATABASE_STORE_HEADER_SIZE {
        return Err(Error::truncated(DATABASE_STORE_HEADER_SIZE, payload.len()));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&payload[DATABASE_STORE_KEY_OFFSET..DATABASE_STORE_KEY_OFFSET + 32]);

    let store_type = match payload[DATABASE_STORE_TYPE_OFFSET] {
        0 => DatabaseStoreType::RouterInfo,
        1 => DatabaseStoreType::LeaseSet,
        other => {
            return Err(Error::InvalidField(format!(
                "unknown database store type {other}"
            )))
        }
    };

    let reply_token = u32::from_be_bytes([
        payload[DATABASE_STORE_REPLY_TOKEN_OFFSET],
        payload[DATABASE_STORE_REPLY_TOKEN_OFFSET + 1],
        payload[DATABASE_STORE_REPLY_TOKEN_OFFSET + 2],
        payload[DATABASE_STORE_REPLY_TOKEN_OFFSET + 3],
    ]);

    let mut offset = DATABASE_STORE_HEADER_SIZE;
    let reply = if reply_token != 0 {
        if payload.len() < offset + 36 {
            return Err(Error::truncated(offset + 36, payload.len()));
        }
        let tunnel_id = u32::from_be_bytes([
            payload[offset],
            payload[offset + 1],
            payload[offset + 2],
            payload[offset + 3],
        ]);
        let mut gateway = [0u8; 32];
        gateway.copy_from_slice(&payload[offset + 4..offset + 36]);
        offset += 36;
        Some(ReplyPath {
            tunnel_id,
            gateway: gateway.into(),
        })
    } else {
        None
    };

    let data = match store_type {
        DatabaseStoreType::RouterInfo => {
            if payload.len() < offset + 2 {
                return Err(Error::truncated(offset + 2, payload.len()));
            }
            let size = u16::from_be_bytes([payload[offset], payload[offset + 1]]) as usize;
            offset += 2;
            if payload.len() < offset + size {
                return Err(Error::truncated(offset + size, payload.len()));
            }
            payload[offset..offset + size].to_vec()
        }
        DatabaseStoreType::LeaseSet => payload[offset..].to_vec(),
    };

    Ok(DatabaseStore {
        key: key.into(),
        store_type,
        reply_token,
        reply,
        data,
    })
}

// ----- DatabaseLookup -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLookup {
    pub key: IdentHash,
    pub from: IdentHash,
    pub flags: u8,
    pub reply_tunnel_id: Option<u32>,
    pub excluded: Vec<IdentHash>,
    pub reply_tag: Option<[u8; 32]>,
}

pub fn create_database_lookup_msg(
    key: &IdentHash,
    from: &IdentHash,
    reply_tunnel_id: Option<u32>,
    exploratory: bool,
    excluded: &[IdentHash],
    reply_tag: Option<&[u8; 32]>,
) -> Result<Message> {
    if excluded.len() > u16::MAX as usize {
        return Err(Error::InvalidField(format!(
            "{} excluded peers exceed the 16-bit count",
            excluded.len()
        )));
    }

    let mut flags = 0u8;
    if reply_tunnel_id.is_some() {
        flags |= DATABASE_LOOKUP_DELIVERY_FLAG;
    }
    if reply_tag.is_some() {
        flags |= DATABASE_LOOKUP_ENCRYPTION_FLAG;
    }
    if exploratory {
        flags |= DATABASE_LOOKUP_EXPLORATORY_FLAG;
    }

    let mut payload = Vec::with_capacity(65 + 4 + 2 + excluded.len() * 32 + 32);
    payload.extend_from_slice(key.as_bytes());
    payload.extend_from_slice(from.as_bytes());
    payload.push(flags);
    if let Some(tunnel_id) = reply_tunnel_id {
        payload.extend_from_slice(&tunnel_id.to_be_bytes());
    }
    payload.extend_from_slice(&(excluded.len() as u16).to_be_bytes());
    for peer in excluded {
        payload.extend_from_slice(peer.as_bytes());
    }
    if let Some(tag) = reply_tag {
        payload.extend_from_slice(tag);
    }
    Ok(create_message(MessageType::DatabaseLookup, &payload, 0))
}

fn parse_database_lookup(payload: &[u8]) -> Result<DatabaseLookup> {
    if payload.len() < 65 {
        return Err(Error::truncated(65, payload.len()));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&payload[..32]);
    let mut from = [0u8; 32];
    from.copy_from_slice(&payload[32..64]);
    let flags = payload[64];
    let mut offset = 65;

    let reply_tunnel_id = if flags & DATABASE_LOOKUP_DELIVERY_FLAG != 0 {
        if payload.len() < offset + 4 {
            return Err(Error::truncated(offset + 4, payload.len()));
        }
        let id = u32::from_be_bytes([
            payload[offset],
            payload[offset + 1],
            payload[offset + 2],
            payload[offset + 3],
        ]);
        offset += 4;
        Some(id)
    } else {
        None
    };

    if payload.len() < offset + 2 {
        return Err(Error::truncated(offset + 2, payload.len()));
    }
    let count = u16::from_be_bytes([payload[offset], payload[offset + 1]]) as usize;
    offset += 2;
    if payload.len() < offset + count * 32 {
        return Err(Error::truncated(offset + count * 32, payload.len()));
    }
    let mut excluded = Vec::with_capacity(count);
    for _ in 0..count {
        let mut peer = [0u8; 32];
        peer.copy_from_slice(&payload[offset..offset + 32]);
        excluded.push(IdentHash(peer));
        offset += 32;
    }

    let reply_tag = if flags & DATABASE_LOOKUP_ENCRYPTION_FLAG != 0 {
        if payload.len() < offset + 32 {
            return Err(Error::truncated(offset + 32, payload.len()));
        }
        let mut tag = [0u8; 32];
        tag.copy_from_slice(&payload[offset..offset + 32]);
        Some(tag)
    } else {
        None
    };

    Ok(DatabaseLookup {
        key: key.into(),
        from: from.into(),
        flags,
        reply_tunnel_id,
        excluded,
        reply_tag,
    })
}

// ----- DatabaseSearchReply -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSearchReply {
    pub key: IdentHash,
    pub peers: Vec<IdentHash>,
    pub from: IdentHash,
}

pub fn create_database_search_reply_msg(
    key: &IdentHash,
    peers: &[IdentHash],
    from: &IdentHash,
) -> Result<Message> {
    if peers.len() > u8::MAX as usize {
        return Err(Error::InvalidField(format!(
            "{} peers exceed the 8-bit count",
            peers.len()
        )));
    }

    let mut payload = Vec::with_capacity(65 + peers.len() * 32);
    payload.extend_from_slice(key.as_bytes());
    payload.push(peers.len() as u8);
    for peer in peers {
        payload.extend_from_slice(peer.as_bytes());
    }
    payload.extend_from_slice(from.as_bytes());
    Ok(create_message(MessageType::DatabaseSearchReply, &payload, 0))
}

fn parse_database_search_reply(payload: &[u8]) -> Result<DatabaseSearchReply> {
    if payload.len() < 33 {
        return Err(Error::truncated(33, payload.len()));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&payload[..32]);
    let count = payload[32] as usize;

    let needed = 33 + count * 32 + 32;
    if payload.len() < needed {
        return Err(Error::truncated(needed, payload.len()));
    }

    let mut offset = 33;
    let mut peers = Vec::with_capacity(count);
    for _ in 0..count {
        let mut peer = [0u8; 32];
        peer.copy_from_slice(&payload[offset..offset + 32]);
        peers.push(IdentHash(peer));
        offset += 32;
    }
    let mut from = [0u8; 32];
    from.copy_from_slice(&payload[offset..offset + 32]);

    Ok(DatabaseSearchReply {
        key: key.into(),
        peers,
        from: from.into(),
    })
}

// ----- TunnelData -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelData {
    pub tunnel_id: u32,
    /// Opaque layered-encrypted content, forwarded without interpretation
    pub data: [u8; TUNNEL_DATA_ENCRYPTED_SIZE],
}

/// Wrap a complete 1028-byte tunnel data block (tunnel ID included).
pub fn create_tunnel_data_msg_from(buf: &[u8; TUNNEL_DATA_MSG_SIZE]) -> Message {
    create_message(MessageType::TunnelData, buf, 0)
}

pub fn create_tunnel_data_msg(
    tunnel_id: u32,
    payload: &[u8; TUNNEL_DATA_ENCRYPTED_SIZE],
) -> Message {
    let mut buf = [0u8; TUNNEL_DATA_MSG_SIZE];
    buf[..4].copy_from_slice(&tunnel_id.to_be_bytes());
    buf[4..].copy_from_slice(payload);
    create_message(MessageType::TunnelData, &buf, 0)
}

fn parse_tunnel_data(payload: &[u8]) -> Result<TunnelData> {
    if payload.len() < TUNNEL_DATA_MSG_SIZE {
        return Err(Error::truncated(TUNNEL_DATA_MSG_SIZE, payload.len()));
    }
    if payload.len() > TUNNEL_DATA_MSG_SIZE {
        return Err(Error::InvalidField(format!(
            "tunnel data message of {} bytes",
            payload.len()
        )));
    }
    let tunnel_id = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let mut data = [0u8; TUNNEL_DATA_ENCRYPTED_SIZE];
    data.copy_from_slice(&payload[4..]);
    Ok(TunnelData { tunnel_id, data })
}

// ----- TunnelGateway -----

#[derive(Debug)]
pub struct TunnelGateway {
    pub tunnel_id: u32,
    /// The embedded message, re-parsed through its own header
    pub message: Message,
}

pub fn create_tunnel_gateway_msg(tunnel_id: u32, buf: &[u8]) -> Result<Message> {
    if buf.len() > u16::MAX as usize {
        return Err(Error::InvalidField(format!(
            "gateway payload of {} bytes exceeds the 16-bit length",
            buf.len()
        )));
    }
    let mut payload = Vec::with_capacity(TUNNEL_GATEWAY_HEADER_SIZE + buf.len());
    payload.extend_from_slice(&tunnel_id.to_be_bytes());
    payload.extend_from_slice(&(buf.len() as u16).to_be_bytes());
    payload.extend_from_slice(buf);
    Ok(create_message(MessageType::TunnelGateway, &payload, 0))
}

/// Build the embedded message from raw payload bytes, then wrap it.
pub fn create_tunnel_gateway_msg_typed(
    tunnel_id: u32,
    msg_type: MessageType,
    buf: &[u8],
    reply_msg_id: u32,
) -> Result<Message> {
    let inner = create_message(msg_type, buf, reply_msg_id);
    create_tunnel_gateway_msg(tunnel_id, inner.as_wire())
}

/// Wrap an already framed message for delivery through a gateway.
pub fn create_tunnel_gateway_msg_from(tunnel_id: u32, msg: &Message) -> Result<Message> {
    create_tunnel_gateway_msg(tunnel_id, msg.as_wire())
}

fn parse_tunnel_gateway(payload: &[u8]) -> Result<TunnelGateway> {
    if payload.len() < TUNNEL_GATEWAY_HEADER_SIZE {
        return Err(Error::truncated(TUNNEL_GATEWAY_HEADER_SIZE, payload.len()));
    }
    let tunnel_id = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let length = u16::from_be_bytes([
        payload[TUNNEL_GATEWAY_HEADER_LENGTH_OFFSET],
        payload[TUNNEL_GATEWAY_HEADER_LENGTH_OFFSET + 1],
    ]) as usize;

    let end = TUNNEL_GATEWAY_HEADER_SIZE + length;
    if payload.len() < end {
        return Err(Error::truncated(end, payload.len()));
    }
    let message = Message::from_wire(&payload[TUNNEL_GATEWAY_HEADER_SIZE..end])?;
    Ok(TunnelGateway { tunnel_id, message })
}

// ----- dispatch -----

/// Typed view over a message's payload
#[derive(Debug)]
pub enum Payload {
    DatabaseStore(DatabaseStore),
    DatabaseLookup(DatabaseLookup),
    DatabaseSearchReply(DatabaseSearchReply),
    DeliveryStatus(DeliveryStatus),
    Garlic(Vec<u8>),
    TunnelData(TunnelData),
    TunnelGateway(TunnelGateway),
    Data(Vec<u8>),
    TunnelBuild(Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>),
    TunnelBuildReply(Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>),
    VariableTunnelBuild(Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>),
    VariableTunnelBuildReply(Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>),
}

/// Parse a message's payload according to its type tag.
pub fn parse_payload(msg: &Message) -> Result<Payload> {
    let msg_type = MessageType::from_u8(msg.type_id())
        .ok_or_else(|| Error::InvalidField(format!("unknown message type {}", msg.type_id())))?;
    let payload = msg.payload();

    Ok(match msg_type {
        MessageType::DatabaseStore => Payload::DatabaseStore(parse_database_store(payload)?),
        MessageType::DatabaseLookup => Payload::DatabaseLookup(parse_database_lookup(payload)?),
        MessageType::DatabaseSearchReply => {
            Payload::DatabaseSearchReply(parse_database_search_reply(payload)?)
        }
        MessageType::DeliveryStatus => Payload::DeliveryStatus(parse_delivery_status(payload)?),
        MessageType::Garlic => Payload::Garlic(payload.to_vec()),
        MessageType::TunnelData => Payload::TunnelData(parse_tunnel_data(payload)?),
        MessageType::TunnelGateway => Payload::TunnelGateway(parse_tunnel_gateway(payload)?),
        MessageType::Data => Payload::Data(payload.to_vec()),
        MessageType::TunnelBuild => Payload::TunnelBuild(parse_tunnel_build(payload)?),
        MessageType::TunnelBuildReply => Payload::TunnelBuildReply(parse_tunnel_build(payload)?),
        MessageType::VariableTunnelBuild => {
            Payload::VariableTunnelBuild(parse_variable_tunnel_build(payload)?)
        }
        MessageType::VariableTunnelBuildReply => {
            Payload::VariableTunnelBuildReply(parse_variable_tunnel_build(payload)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoCompression;

    impl Compression for NoCompression {
        fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.to_vec())
        }
        fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.to_vec())
        }
    }

    fn hash(fill: u8) -> IdentHash {
        IdentHash([fill; 32])
    }

    #[test]
    fn delivery_status_concrete_scenario() {
        let msg = create_delivery_status_msg(42);

        assert_eq!(msg.type_id(), 10);
        assert_eq!(msg.payload_length(), 12);
        let expiration = msg.expiration();
        assert!(expiration > 0);

        match parse_payload(&msg).unwrap() {
            Payload::DeliveryStatus(status) => {
                assert_eq!(status.msg_id, 42);
                assert!(status.timestamp <= time::millis_since_epoch());
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn database_search_reply_preserves_peer_order() {
        let peers = vec![hash(0x11), hash(0x22), hash(0x33)];
        let msg = create_database_search_reply_msg(&hash(0xaa), &peers, &hash(0xbb)).unwrap();

        match parse_payload(&msg).unwrap() {
            Payload::DatabaseSearchReply(reply) => {
                assert_eq!(reply.key, hash(0xaa));
                assert_eq!(reply.from, hash(0xbb));
                assert_eq!(reply.peers, peers);
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn database_lookup_roundtrip_with_all_options() {
        let excluded = vec![hash(1), hash(2)];
        let tag = [0x7fu8; 32];
        let msg = create_database_lookup_msg(
            &hash(0xcc),
            &hash(0xdd),
            Some(777),
            true,
            &excluded,
            Some(&tag),
        )
        .unwrap();

        match parse_payload(&msg).unwrap() {
            Payload::DatabaseLookup(lookup) => {
                assert_eq!(lookup.key, hash(0xcc));
                assert_eq!(lookup.from, hash(0xdd));
                assert_eq!(lookup.reply_tunnel_id, Some(777));
                assert_ne!(lookup.flags & DATABASE_LOOKUP_EXPLORATORY_FLAG, 0);
                assert_eq!(lookup.excluded, excluded);
                assert_eq!(lookup.reply_tag, Some(tag));
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn database_lookup_minimal_form() {
        let msg = create_database_lookup_msg(&hash(1), &hash(2), None, false, &[], None).unwrap();
        match parse_payload(&msg).unwrap() {
            Payload::DatabaseLookup(lookup) => {
                assert_eq!(lookup.flags, 0);
                assert_eq!(lookup.reply_tunnel_id, None);
                assert!(lookup.excluded.is_empty());
                assert_eq!(lookup.reply_tag, None);
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn database_store_router_info_roundtrip() {
        let record = b"router info record bytes".to_vec();
        let msg =
            create_database_store_router_info_msg(&hash(9), &record, &NoCompression).unwrap();

        match parse_payload(&msg).unwrap() {
            Payload::DatabaseStore(store) => {
                assert_eq!(store.store_type, DatabaseStoreType::RouterInfo);
                assert_eq!(store.reply_token, 0);
                assert_eq!(store.reply, None);
                assert_eq!(NoCompression.decompress(&store.data).unwrap(), record);
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn database_store_lease_set_with_reply_path() {
        let reply = ReplyPath {
            tunnel_id: 31337,
            gateway: hash(0xee),
        };
        let msg =
            create_database_store_lease_set_msg(&hash(5), b"leaseset", 900, Some(reply)).unwrap();

        match parse_payload(&msg).unwrap() {
            Payload::DatabaseStore(store) => {
                assert_eq!(store.store_type, DatabaseStoreType::LeaseSet);
                assert_eq!(store.reply_token, 900);
                assert_eq!(store.reply, Some(reply));
                assert_eq!(store.data, b"leaseset");
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn reply_token_requires_reply_path() {
        let result = create_database_store_lease_set_msg(&hash(5), b"ls", 900, None);
        assert!(matches!(result, Err(Error::InvalidField(_))));
    }

    #[test]
    fn tunnel_data_roundtrip() {
        let content = [0x42u8; TUNNEL_DATA_ENCRYPTED_SIZE];
        let msg = create_tunnel_data_msg(8080, &content);
        assert_eq!(msg.payload_length(), TUNNEL_DATA_MSG_SIZE);

        match parse_payload(&msg).unwrap() {
            Payload::TunnelData(data) => {
                assert_eq!(data.tunnel_id, 8080);
                assert_eq!(data.data, content);
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn tunnel_gateway_recurses_into_embedded_message() {
        let inner = create_delivery_status_msg(7);
        let msg = create_tunnel_gateway_msg_from(123, &inner).unwrap();

        match parse_payload(&msg).unwrap() {
            Payload::TunnelGateway(gateway) => {
                assert_eq!(gateway.tunnel_id, 123);
                assert_eq!(
                    gateway.message.type_id(),
                    MessageType::DeliveryStatus as u8
                );
                match parse_payload(&gateway.message).unwrap() {
                    Payload::DeliveryStatus(status) => assert_eq!(status.msg_id, 7),
                    other => panic!("wrong inner payload: {other:?}"),
                }
            }
            other => panic!("wrong payload kind: {other:?}"),
        }
    }

    #[test]
    fn unknown_message_type_rejected() {
        let mut msg = Message::new_short();
        msg.set_type_id(200);
        msg.update_size();
        assert!(matches!(
            parse_payload(&msg),
            Err(Error::InvalidField(_))
        ));
    }
}
