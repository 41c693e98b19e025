//! Tunnel build records
//!
//! A tunnel is negotiated with one 528-byte encrypted record per hop:
//! a 16-byte truncated recipient identity hash followed by the
//! asymmetrically encrypted 222-byte cleartext request. Responses reuse
//! the record size with a digest-protected status byte. The asymmetric
//! cipher itself lives behind the [`BuildRecordEncryptor`] /
//! [`BuildRecordDecryptor`] seams; this module owns the byte layouts and
//! the record-selection scan.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::messages::{create_message, MessageType};
use super::{IdentHash, Message};
use crate::error::{Error, Result};
use crate::time;

pub const TUNNEL_BUILD_RECORD_SIZE: usize = 528;
/// Fixed record count of a (non-variable) TunnelBuild message.
pub const NUM_TUNNEL_BUILD_RECORDS: usize = 8;

// Encrypted request record: toPeer(16) | encrypted cleartext(512)
pub const BUILD_REQUEST_RECORD_TO_PEER_OFFSET: usize = 0;
pub const BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET: usize = BUILD_REQUEST_RECORD_TO_PEER_OFFSET + 16;
pub const BUILD_REQUEST_RECORD_ENCRYPTED_SIZE: usize =
    TUNNEL_BUILD_RECORD_SIZE - BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET;

// Cleartext request record layout
const CLEARTEXT_RECEIVE_TUNNEL_OFFSET: usize = 0;
const CLEARTEXT_OUR_IDENT_OFFSET: usize = 4;
const CLEARTEXT_NEXT_TUNNEL_OFFSET: usize = 36;
const CLEARTEXT_NEXT_IDENT_OFFSET: usize = 40;
const CLEARTEXT_LAYER_KEY_OFFSET: usize = 72;
const CLEARTEXT_IV_KEY_OFFSET: usize = 104;
const CLEARTEXT_REPLY_KEY_OFFSET: usize = 136;
const CLEARTEXT_REPLY_IV_OFFSET: usize = 168;
const CLEARTEXT_FLAG_OFFSET: usize = 184;
const CLEARTEXT_REQUEST_TIME_OFFSET: usize = 185;
const CLEARTEXT_NEXT_MSGID_OFFSET: usize = 189;
const CLEARTEXT_FILLER_OFFSET: usize = 193;
pub const BUILD_REQUEST_RECORD_CLEARTEXT_SIZE: usize = CLEARTEXT_FILLER_OFFSET + 29;

/// Flag bit: this hop is the tunnel's inbound gateway.
pub const BUILD_REQUEST_FLAG_GATEWAY: u8 = 0x80;
/// Flag bit: this hop is the tunnel's outbound endpoint.
pub const BUILD_REQUEST_FLAG_ENDPOINT: u8 = 0x40;

// Response record: hash(32) | padding(495) | status(1)
pub const BUILD_RESPONSE_RECORD_HASH_OFFSET: usize = 0;
pub const BUILD_RESPONSE_RECORD_PADDING_OFFSET: usize = 32;
pub const BUILD_RESPONSE_RECORD_PADDING_SIZE: usize = 495;
pub const BUILD_RESPONSE_RECORD_RET_OFFSET: usize =
    BUILD_RESPONSE_RECORD_PADDING_OFFSET + BUILD_RESPONSE_RECORD_PADDING_SIZE;

/// Asymmetric encryption of a cleartext build record under one peer's
/// public encryption key. Instances are constructed per peer by the
/// caller; the key never passes through this module.
pub trait BuildRecordEncryptor {
    fn encrypt(
        &self,
        cleartext: &[u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE],
        out: &mut [u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE],
    ) -> Result<()>;
}

/// Decryption side of [`BuildRecordEncryptor`], holding this router's
/// private encryption key.
pub trait BuildRecordDecryptor {
    fn decrypt(
        &self,
        ciphertext: &[u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE],
        out: &mut [u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE],
    ) -> Result<()>;
}

/// Cleartext form of one hop's build request.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BuildRequestRecord {
    pub receive_tunnel: u32,
    pub our_ident: IdentHash,
    pub next_tunnel: u32,
    pub next_ident: IdentHash,
    pub layer_key: [u8; 32],
    pub iv_key: [u8; 32],
    pub reply_key: [u8; 32],
    pub reply_iv: [u8; 16],
    pub flags: u8,
    /// Whole hours since the epoch at request time
    pub request_time: u32,
    pub next_msg_id: u32,
}

impl BuildRequestRecord {
    /// Assemble a request for one hop. `request_time` is stamped from the
    /// clock at hour granularity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        our_ident: IdentHash,
        receive_tunnel: u32,
        next_ident: IdentHash,
        next_tunnel: u32,
        layer_key: [u8; 32],
        iv_key: [u8; 32],
        reply_key: [u8; 32],
        reply_iv: [u8; 16],
        next_msg_id: u32,
        is_gateway: bool,
        is_endpoint: bool,
    ) -> Self {
        let mut flags = 0u8;
        if is_gateway {
            flags |= BUILD_REQUEST_FLAG_GATEWAY;
        }
        if is_endpoint {
            flags |= BUILD_REQUEST_FLAG_ENDPOINT;
        }
        Self {
            receive_tunnel,
            our_ident,
            next_tunnel,
            next_ident,
            layer_key,
            iv_key,
            reply_key,
            reply_iv,
            flags,
            request_time: time::hours_since_epoch(),
            next_msg_id,
        }
    }

    pub fn is_gateway(&self) -> bool {
        self.flags & BUILD_REQUEST_FLAG_GATEWAY != 0
    }

    pub fn is_endpoint(&self) -> bool {
        self.flags & BUILD_REQUEST_FLAG_ENDPOINT != 0
    }

    /// Serialize to the 222-byte wire form. The trailing filler is
    /// random, not zero: a constant pattern would distinguish build
    /// records after decryption.
    pub fn encode(&self) -> [u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE] {
        let mut out = [0u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE];
        out[CLEARTEXT_RECEIVE_TUNNEL_OFFSET..CLEARTEXT_RECEIVE_TUNNEL_OFFSET + 4]
            .copy_from_slice(&self.receive_tunnel.to_be_bytes());
        out[CLEARTEXT_OUR_IDENT_OFFSET..CLEARTEXT_OUR_IDENT_OFFSET + 32]
            .copy_from_slice(self.our_ident.as_bytes());
        out[CLEARTEXT_NEXT_TUNNEL_OFFSET..CLEARTEXT_NEXT_TUNNEL_OFFSET + 4]
            .copy_from_slice(&self.next_tunnel.to_be_bytes());
        out[CLEARTEXT_NEXT_IDENT_OFFSET..CLEARTEXT_NEXT_IDENT_OFFSET + 32]
            .copy_from_slice(self.next_ident.as_bytes());
        out[CLEARTEXT_LAYER_KEY_OFFSET..CLEARTEXT_LAYER_KEY_OFFSET + 32]
            .copy_from_slice(&self.layer_key);
        out[CLEARTEXT_IV_KEY_OFFSET..CLEARTEXT_IV_KEY_OFFSET + 32].copy_from_slice(&self.iv_key);
        out[CLEARTEXT_REPLY_KEY_OFFSET..CLEARTEXT_REPLY_KEY_OFFSET + 32]
            .copy_from_slice(&self.reply_key);
        out[CLEARTEXT_REPLY_IV_OFFSET..CLEARTEXT_REPLY_IV_OFFSET + 16]
            .copy_from_slice(&self.reply_iv);
        out[CLEARTEXT_FLAG_OFFSET] = self.flags;
        out[CLEARTEXT_REQUEST_TIME_OFFSET..CLEARTEXT_REQUEST_TIME_OFFSET + 4]
            .copy_from_slice(&self.request_time.to_be_bytes());
        out[CLEARTEXT_NEXT_MSGID_OFFSET..CLEARTEXT_NEXT_MSGID_OFFSET + 4]
            .copy_from_slice(&self.next_msg_id.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut out[CLEARTEXT_FILLER_OFFSET..]);
        out
    }

    /// Parse the 222-byte wire form. Filler bytes are discarded.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < BUILD_REQUEST_RECORD_CLEARTEXT_SIZE {
            return Err(Error::truncated(
                BUILD_REQUEST_RECORD_CLEARTEXT_SIZE,
                bytes.len(),
            ));
        }

        let read_u32 = |offset: usize| {
            u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        let read_hash = |offset: usize| {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&bytes[offset..offset + 32]);
            hash
        };

        let mut reply_iv = [0u8; 16];
        reply_iv.copy_from_slice(&bytes[CLEARTEXT_REPLY_IV_OFFSET..CLEARTEXT_REPLY_IV_OFFSET + 16]);

        Ok(Self {
            receive_tunnel: read_u32(CLEARTEXT_RECEIVE_TUNNEL_OFFSET),
            our_ident: read_hash(CLEARTEXT_OUR_IDENT_OFFSET).into(),
            next_tunnel: read_u32(CLEARTEXT_NEXT_TUNNEL_OFFSET),
            next_ident: read_hash(CLEARTEXT_NEXT_IDENT_OFFSET).into(),
            layer_key: read_hash(CLEARTEXT_LAYER_KEY_OFFSET),
            iv_key: read_hash(CLEARTEXT_IV_KEY_OFFSET),
            reply_key: read_hash(CLEARTEXT_REPLY_KEY_OFFSET),
            reply_iv,
            flags: bytes[CLEARTEXT_FLAG_OFFSET],
            request_time: read_u32(CLEARTEXT_REQUEST_TIME_OFFSET),
            next_msg_id: read_u32(CLEARTEXT_NEXT_MSGID_OFFSET),
        })
    }
}

impl std::fmt::Debug for BuildRequestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the symmetric keys
        f.debug_struct("BuildRequestRecord")
            .field("receive_tunnel", &self.receive_tunnel)
            .field("our_ident", &self.our_ident)
            .field("next_tunnel", &self.next_tunnel)
            .field("next_ident", &self.next_ident)
            .field("flags", &self.flags)
            .field("request_time", &self.request_time)
            .field("next_msg_id", &self.next_msg_id)
            .finish_non_exhaustive()
    }
}

/// Encrypt one hop's request into its 528-byte record slot: the peer's
/// truncated identity hash, then the asymmetric ciphertext.
pub fn encrypt_build_request_record(
    peer_ident: &IdentHash,
    record: &BuildRequestRecord,
    encryptor: &dyn BuildRecordEncryptor,
    out: &mut [u8; TUNNEL_BUILD_RECORD_SIZE],
) -> Result<()> {
    out[..BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET]
        .copy_from_slice(&peer_ident.as_bytes()[..BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET]);

    let cleartext = record.encode();
    let mut body = [0u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE];
    encryptor.encrypt(&cleartext, &mut body)?;
    out[BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET..].copy_from_slice(&body);
    Ok(())
}

/// Scan build records for the one addressed to this router and decrypt it.
///
/// Returns the record index and cleartext on a match, `Ok(None)` when no
/// record carries our truncated identity hash — a legitimate outcome for
/// routers not on the tunnel path, distinct from a decode error. With
/// several matching records the first wins; multiplicity policy is the
/// caller's.
pub fn handle_build_request_records(
    records: &[u8],
    our_ident: &IdentHash,
    decryptor: &dyn BuildRecordDecryptor,
) -> Result<Option<(usize, BuildRequestRecord)>> {
    if records.len() % TUNNEL_BUILD_RECORD_SIZE != 0 {
        return Err(Error::InvalidField(format!(
            "{} bytes is not a whole number of build records",
            records.len()
        )));
    }

    let prefix = &our_ident.as_bytes()[..BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET];
    for (index, record) in records.chunks_exact(TUNNEL_BUILD_RECORD_SIZE).enumerate() {
        let to_peer = &record[..BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET];
        if bool::from(to_peer.ct_eq(prefix)) {
            log::debug!("build record {index} is addressed to us");
            let mut ciphertext = [0u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE];
            ciphertext.copy_from_slice(&record[BUILD_REQUEST_RECORD_ENCRYPTED_OFFSET..]);
            let mut cleartext = [0u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE];
            decryptor.decrypt(&ciphertext, &mut cleartext)?;
            let parsed = BuildRequestRecord::decode(&cleartext)?;
            cleartext.zeroize();
            return Ok(Some((index, parsed)));
        }
    }
    log::debug!("no build record addressed to us");
    Ok(None)
}

/// Build a response record: digest over padding and status, random
/// padding, the status byte last. Status 0 accepts the hop.
pub fn create_build_response_record(status: u8) -> [u8; TUNNEL_BUILD_RECORD_SIZE] {
    let mut record = [0u8; TUNNEL_BUILD_RECORD_SIZE];
    rand::thread_rng().fill_bytes(
        &mut record[BUILD_RESPONSE_RECORD_PADDING_OFFSET..BUILD_RESPONSE_RECORD_RET_OFFSET],
    );
    record[BUILD_RESPONSE_RECORD_RET_OFFSET] = status;
    let digest = Sha256::digest(&record[BUILD_RESPONSE_RECORD_PADDING_OFFSET..]);
    record[..BUILD_RESPONSE_RECORD_PADDING_OFFSET].copy_from_slice(&digest);
    record
}

/// Read a (symmetrically decrypted) response record's status byte,
/// checking the digest over padding and status first.
pub fn read_build_response_record(record: &[u8]) -> Result<u8> {
    if record.len() < TUNNEL_BUILD_RECORD_SIZE {
        return Err(Error::truncated(TUNNEL_BUILD_RECORD_SIZE, record.len()));
    }
    let digest = Sha256::digest(
        &record[BUILD_RESPONSE_RECORD_PADDING_OFFSET..TUNNEL_BUILD_RECORD_SIZE],
    );
    if digest.as_slice() != &record[..BUILD_RESPONSE_RECORD_PADDING_OFFSET] {
        return Err(Error::DigestMismatch);
    }
    Ok(record[BUILD_RESPONSE_RECORD_RET_OFFSET])
}

/// Whether a full set of response statuses accepts the tunnel: every hop
/// must accept; any nonzero status rejects the build.
pub fn tunnel_build_accepted(statuses: &[u8]) -> bool {
    statuses.iter().all(|&status| status == 0)
}

fn records_payload(records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]], with_count: bool) -> Vec<u8> {
    let mut payload =
        Vec::with_capacity(usize::from(with_count) + records.len() * TUNNEL_BUILD_RECORD_SIZE);
    if with_count {
        payload.push(records.len() as u8);
    }
    for record in records {
        payload.extend_from_slice(record);
    }
    payload
}

fn check_fixed_count(records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]]) -> Result<()> {
    if records.len() != NUM_TUNNEL_BUILD_RECORDS {
        return Err(Error::InvalidField(format!(
            "fixed tunnel build carries exactly {NUM_TUNNEL_BUILD_RECORDS} records, got {}",
            records.len()
        )));
    }
    Ok(())
}

fn check_variable_count(records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]]) -> Result<()> {
    if records.is_empty() || records.len() > NUM_TUNNEL_BUILD_RECORDS {
        return Err(Error::InvalidField(format!(
            "variable tunnel build carries 1..={NUM_TUNNEL_BUILD_RECORDS} records, got {}",
            records.len()
        )));
    }
    Ok(())
}

pub fn create_tunnel_build_msg(records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]]) -> Result<Message> {
    check_fixed_count(records)?;
    Ok(create_message(
        MessageType::TunnelBuild,
        &records_payload(records, false),
        0,
    ))
}

pub fn create_tunnel_build_reply_msg(
    records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]],
    reply_msg_id: u32,
) -> Result<Message> {
    check_fixed_count(records)?;
    Ok(create_message(
        MessageType::TunnelBuildReply,
        &records_payload(records, false),
        reply_msg_id,
    ))
}

pub fn create_variable_tunnel_build_msg(
    records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]],
) -> Result<Message> {
    check_variable_count(records)?;
    Ok(create_message(
        MessageType::VariableTunnelBuild,
        &records_payload(records, true),
        0,
    ))
}

pub fn create_variable_tunnel_build_reply_msg(
    records: &[[u8; TUNNEL_BUILD_RECORD_SIZE]],
    reply_msg_id: u32,
) -> Result<Message> {
    check_variable_count(records)?;
    Ok(create_message(
        MessageType::VariableTunnelBuildReply,
        &records_payload(records, true),
        reply_msg_id,
    ))
}

fn collect_records(bytes: &[u8], count: usize) -> Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]> {
    let mut records = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(TUNNEL_BUILD_RECORD_SIZE) {
        let mut record = [0u8; TUNNEL_BUILD_RECORD_SIZE];
        record.copy_from_slice(chunk);
        records.push(record);
    }
    records
}

/// Parse a fixed TunnelBuild(Reply) payload: exactly 8 records, no count.
pub fn parse_tunnel_build(payload: &[u8]) -> Result<Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>> {
    let expected = NUM_TUNNEL_BUILD_RECORDS * TUNNEL_BUILD_RECORD_SIZE;
    if payload.len() < expected {
        return Err(Error::truncated(expected, payload.len()));
    }
    if payload.len() > expected {
        return Err(Error::InvalidField(format!(
            "fixed tunnel build payload of {} bytes",
            payload.len()
        )));
    }
    Ok(collect_records(payload, NUM_TUNNEL_BUILD_RECORDS))
}

/// Parse a VariableTunnelBuild(Reply) payload: 1-byte count, then records.
pub fn parse_variable_tunnel_build(
    payload: &[u8],
) -> Result<Vec<[u8; TUNNEL_BUILD_RECORD_SIZE]>> {
    if payload.is_empty() {
        return Err(Error::truncated(1, 0));
    }
    let count = payload[0] as usize;
    if count == 0 || count > NUM_TUNNEL_BUILD_RECORDS {
        return Err(Error::InvalidField(format!(
            "variable tunnel build record count {count}"
        )));
    }
    let expected = 1 + count * TUNNEL_BUILD_RECORD_SIZE;
    if payload.len() < expected {
        return Err(Error::truncated(expected, payload.len()));
    }
    if payload.len() > expected {
        return Err(Error::InvalidField(format!(
            "variable tunnel build payload of {} bytes for {count} records",
            payload.len()
        )));
    }
    Ok(collect_records(&payload[1..], count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2np::messages::{parse_payload, Payload};

    /// Reversible stand-in for the asymmetric record cipher: XOR with a
    /// fixed byte, expanded with deterministic trailing filler.
    struct XorCipher(u8);

    impl BuildRecordEncryptor for XorCipher {
        fn encrypt(
            &self,
            cleartext: &[u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE],
            out: &mut [u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE],
        ) -> crate::error::Result<()> {
            for (dst, src) in out.iter_mut().zip(cleartext.iter()) {
                *dst = src ^ self.0;
            }
            for dst in out.iter_mut().skip(cleartext.len()) {
                *dst = self.0;
            }
            Ok(())
        }
    }

    impl BuildRecordDecryptor for XorCipher {
        fn decrypt(
            &self,
            ciphertext: &[u8; BUILD_REQUEST_RECORD_ENCRYPTED_SIZE],
            out: &mut [u8; BUILD_REQUEST_RECORD_CLEARTEXT_SIZE],
        ) -> crate::error::Result<()> {
            for (dst, src) in out.iter_mut().zip(ciphertext.iter()) {
                *dst = src ^ self.0;
            }
            Ok(())
        }
    }

    fn sample_record(our_ident: IdentHash) -> BuildRequestRecord {
        BuildRequestRecord::new(
            our_ident,
            1001,
            IdentHash([0x44; 32]),
            1002,
            [0x10; 32],
            [0x20; 32],
            [0x30; 32],
            [0x40; 16],
            555_000,
            true,
            false,
        )
    }

    #[test]
    fn cleartext_record_roundtrip() {
        let record = sample_record(IdentHash([0x77; 32]));
        let encoded = record.encode();
        assert_eq!(encoded.len(), BUILD_REQUEST_RECORD_CLEARTEXT_SIZE);

        let decoded = BuildRequestRecord::decode(&encoded).unwrap();
        assert_eq!(decoded, record);
        assert!(decoded.is_gateway());
        assert!(!decoded.is_endpoint());
    }

    #[test]
    fn filler_varies_between_encodings() {
        let record = sample_record(IdentHash([0x77; 32]));
        let a = record.encode();
        let b = record.encode();
        // Fields agree, random filler (29 bytes) almost surely differs
        assert_eq!(a[..CLEARTEXT_FILLER_OFFSET], b[..CLEARTEXT_FILLER_OFFSET]);
        assert_ne!(a[CLEARTEXT_FILLER_OFFSET..], b[CLEARTEXT_FILLER_OFFSET..]);
    }

    #[test]
    fn build_request_roundtrip_selects_single_match() {
        let us = IdentHash([0xab; 32]);
        let cipher = XorCipher(0x5c);
        let original = sample_record(us);

        // Eight records, ours at index 3
        let mut records = vec![[0u8; TUNNEL_BUILD_RECORD_SIZE]; NUM_TUNNEL_BUILD_RECORDS];
        for (i, slot) in records.iter_mut().enumerate() {
            if i == 3 {
                encrypt_build_request_record(&us, &original, &cipher, slot).unwrap();
            } else {
                // Other hops' records: distinct prefix, opaque body
                slot[..16].copy_from_slice(&[i as u8 + 1; 16]);
                slot[16..].fill(0x99);
            }
        }
        let snapshot = records.clone();
        let flat: Vec<u8> = records.concat();

        let (index, cleartext) = handle_build_request_records(&flat, &us, &cipher)
            .unwrap()
            .expect("one record is addressed to us");
        assert_eq!(index, 3);
        assert_eq!(cleartext, original);

        // The seven pass-through records are untouched by the scan
        for (i, record) in snapshot.iter().enumerate() {
            if i != 3 {
                assert_eq!(&flat[i * 528..(i + 1) * 528], record);
            }
        }
    }

    #[test]
    fn no_match_is_a_distinct_outcome() {
        let cipher = XorCipher(0x11);
        let records = vec![0u8; 2 * TUNNEL_BUILD_RECORD_SIZE];
        let result =
            handle_build_request_records(&records, &IdentHash([0xfe; 32]), &cipher).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn ragged_record_buffer_rejected() {
        let cipher = XorCipher(0x11);
        let records = vec![0u8; TUNNEL_BUILD_RECORD_SIZE + 7];
        assert!(matches!(
            handle_build_request_records(&records, &IdentHash([1; 32]), &cipher),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn response_record_roundtrip_and_digest() {
        let record = create_build_response_record(0);
        assert_eq!(read_build_response_record(&record).unwrap(), 0);

        let reject = create_build_response_record(30);
        assert_eq!(read_build_response_record(&reject).unwrap(), 30);

        let mut corrupted = record;
        corrupted[100] ^= 0x01;
        assert_eq!(
            read_build_response_record(&corrupted),
            Err(Error::DigestMismatch)
        );
    }

    #[test]
    fn build_acceptance_aggregate() {
        assert!(tunnel_build_accepted(&[0, 0, 0]));
        assert!(!tunnel_build_accepted(&[0, 30, 0]));
        assert!(tunnel_build_accepted(&[]));
    }

    #[test]
    fn tunnel_build_message_roundtrip() {
        let mut records = vec![[0u8; TUNNEL_BUILD_RECORD_SIZE]; NUM_TUNNEL_BUILD_RECORDS];
        for (i, record) in records.iter_mut().enumerate() {
            record.fill(i as u8);
        }

        let msg = create_tunnel_build_msg(&records).unwrap();
        match parse_payload(&msg).unwrap() {
            Payload::TunnelBuild(parsed) => assert_eq!(parsed, records),
            other => panic!("wrong payload kind: {other:?}"),
        }

        // Fixed form requires exactly eight records
        assert!(matches!(
            create_tunnel_build_msg(&records[..7]),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn variable_tunnel_build_message_roundtrip() {
        let mut records = vec![[0u8; TUNNEL_BUILD_RECORD_SIZE]; 3];
        for (i, record) in records.iter_mut().enumerate() {
            record.fill(0x80 + i as u8);
        }

        let msg = create_variable_tunnel_build_msg(&records).unwrap();
        assert_eq!(
            msg.payload_length(),
            1 + 3 * TUNNEL_BUILD_RECORD_SIZE
        );
        match parse_payload(&msg).unwrap() {
            Payload::VariableTunnelBuild(parsed) => assert_eq!(parsed, records),
            other => panic!("wrong payload kind: {other:?}"),
        }

        let reply = create_variable_tunnel_build_reply_msg(&records, 4242).unwrap();
        assert_eq!(reply.msg_id(), 4242);

        // Declared count must match the payload exactly
        let mut payload = msg.payload().to_vec();
        payload[0] = 4;
        assert!(matches!(
            parse_variable_tunnel_build(&payload),
            Err(Error::Truncated { .. })
        ));
    }
}
