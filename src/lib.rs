//! # i2p-core
//!
//! The message framing and cryptographic identity layer of an I2P
//! router: the I2NP binary protocol that moves control and data between
//! routers and through tunnels, and the pluggable signature subsystem
//! that authenticates router identities and leasesets.
//!
//! ## Architecture
//!
//! ```text
//! inbound bytes
//!   ↓
//! i2np: header + payload parsing
//!   ↓
//! typed payload handlers (build records, tunnel data, netdb shapes)
//!   ↓                                ↑
//! crypto: Verifier / Signer  ────────┘  (identity authentication)
//! ```
//!
//! Outbound construction mirrors it: build payload, sign where required,
//! frame with header, size and checksum.
//!
//! The crate is compute-only and synchronous: no sockets, no storage, no
//! internal suspension points. Transports, tunnel selection, the network
//! database, asymmetric record encryption and gzip are all reached
//! through the collaborator traits in [`i2np`].

pub mod crypto;
pub mod error;
pub mod i2np;
pub mod time;

pub use crypto::{
    create_signer, create_verifier, generate_keypair, KeyPair, Signer, SigningKeyType, Verifier,
};
pub use error::{Error, Result};
pub use i2np::{IdentHash, Message};
