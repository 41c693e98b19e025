//! I2NP message codec
//!
//! Implements the wire protocol used to move control and data between
//! routers and through tunnels:
//! - Message envelope with long/short header codec
//! - Constructors and parsers for every message kind
//! - Tunnel build request/response records
//!
//! Collaborators (transport framing, tunnel selection, the network
//! database and asymmetric record encryption) are reached through the
//! traits defined here; this module owns byte layouts only.

mod message;
mod messages;
mod tunnel_build;

pub use message::{message_length, Message};
pub use messages::{
    create_database_lookup_msg, create_database_search_reply_msg,
    create_database_store_lease_set_msg, create_database_store_router_info_msg,
    create_delivery_status_msg, create_message, create_tunnel_data_msg,
    create_tunnel_data_msg_from, create_tunnel_gateway_msg, create_tunnel_gateway_msg_from,
    create_tunnel_gateway_msg_typed, fill_header, parse_payload, renew_header, DatabaseLookup,
    DatabaseSearchReply, DatabaseStore, DatabaseStoreType, DeliveryStatus, MessageType, Payload,
    ReplyPath, TunnelData, TunnelGateway, DATABASE_LOOKUP_DELIVERY_FLAG,
    DATABASE_LOOKUP_ENCRYPTION_FLAG, DATABASE_LOOKUP_EXPLORATORY_FLAG, DELIVERY_STATUS_SIZE,
    TUNNEL_DATA_ENCRYPTED_SIZE, TUNNEL_DATA_MSG_SIZE, TUNNEL_GATEWAY_HEADER_SIZE,
};
pub use tunnel_build::{
    create_build_response_record, create_tunnel_build_msg, create_tunnel_build_reply_msg,
    create_variable_tunnel_build_msg, create_variable_tunnel_build_reply_msg,
    encrypt_build_request_record, handle_build_request_records, parse_tunnel_build,
    parse_variable_tunnel_build, read_build_response_record, tunnel_build_accepted,
    BuildRecordDecryptor, BuildRecordEncryptor, BuildRequestRecord, BUILD_REQUEST_FLAG_ENDPOINT,
    BUILD_REQUEST_FLAG_GATEWAY, BUILD_REQUEST_RECORD_CLEARTEXT_SIZE,
    BUILD_REQUEST_RECORD_ENCRYPTED_SIZE, BUILD_RESPONSE_RECORD_PADDING_SIZE,
    NUM_TUNNEL_BUILD_RECORDS, TUNNEL_BUILD_RECORD_SIZE,
};

use std::fmt;

use zeroize::Zeroize;

use crate::error::Result;

// I2NP header: type(1) | msgID(4) | expiration(8, ms) | size(2) | checksum(1)
pub const I2NP_HEADER_TYPEID_OFFSET: usize = 0;
pub const I2NP_HEADER_MSGID_OFFSET: usize = I2NP_HEADER_TYPEID_OFFSET + 1;
pub const I2NP_HEADER_EXPIRATION_OFFSET: usize = I2NP_HEADER_MSGID_OFFSET + 4;
pub const I2NP_HEADER_SIZE_OFFSET: usize = I2NP_HEADER_EXPIRATION_OFFSET + 8;
pub const I2NP_HEADER_CHKS_OFFSET: usize = I2NP_HEADER_SIZE_OFFSET + 2;
pub const I2NP_HEADER_SIZE: usize = I2NP_HEADER_CHKS_OFFSET + 1;

// Short header used by the UDP transport: type(1) | expiration(4, seconds)
pub const I2NP_SHORT_HEADER_TYPEID_OFFSET: usize = 0;
pub const I2NP_SHORT_HEADER_EXPIRATION_OFFSET: usize = I2NP_SHORT_HEADER_TYPEID_OFFSET + 1;
pub const I2NP_SHORT_HEADER_SIZE: usize = I2NP_SHORT_HEADER_EXPIRATION_OFFSET + 4;

/// Scratch bytes kept in front of `offset` for the outer transport header.
pub const TRANSPORT_HEADER_RESERVE: usize = 2;

pub const I2NP_MAX_MESSAGE_SIZE: usize = 32768;
pub const I2NP_MAX_SHORT_MESSAGE_SIZE: usize = 2400;

/// Horizon written into the expiration field of freshly built messages.
pub const I2NP_MESSAGE_EXPIRATION_TIMEOUT_MS: u64 = 5000;

/// 32-byte digest identifying a router's public identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Zeroize)]
pub struct IdentHash(pub [u8; 32]);

impl IdentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for IdentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for IdentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for IdentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated hex for logs
        write!(f, "IdentHash({}...)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for IdentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Inbound tunnel that delivered a message. Owned by the tunnel pool;
/// envelopes only hold a shared reference.
pub trait InboundTunnel: Send + Sync {
    fn tunnel_id(&self) -> u32;
}

/// Gzip (de)compression of RouterInfo payloads embedded in DatabaseStore
/// messages. Supplied by the caller; not reimplemented here.
pub trait Compression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}
