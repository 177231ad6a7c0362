//! SSH binary packet framing, deliberately stopping short of real key
//! exchange (spec §4.2): responses are sent in cleartext because the
//! attacker never derives session keys, and most scanners tolerate it.

use rand::RngCore;

pub const SSH_MSG_KEXINIT: u8 = 20;
pub const SSH_MSG_USERAUTH_FAILURE: u8 = 51;

const KEX_ALGORITHMS: &str = "curve25519-sha256,ecdh-sha2-nistp256";
const HOST_KEY_ALGORITHMS: &str = "ssh-ed25519,ssh-rsa";
const ENC_ALGORITHMS: &str = "aes256-ctr,aes128-ctr";
const MAC_ALGORITHMS: &str = "hmac-sha2-256,hmac-sha1";
const COMPRESSION_ALGORITHMS: &str = "none";
const LANGUAGES: &str = "";

/// Wraps `payload` in SSH binary packet framing: big-endian `packet_length`,
/// `padding_length`, the payload, then that many random padding bytes.
/// `padding_length` is the smallest value >= 4 that makes the whole framed
/// packet (length field included) a multiple of 8 bytes.
pub fn frame_packet(payload: &[u8]) -> Vec<u8> {
    let unpadded_len = payload.len() + 1; // +1 for the padding_length byte itself
    let mut padding_len = 8 - ((unpadded_len + 4) % 8);
    if padding_len < 4 {
        padding_len += 8;
    }
    let packet_length = unpadded_len + padding_len;

    let mut out = Vec::with_capacity(4 + packet_length);
    out.extend_from_slice(&(packet_length as u32).to_be_bytes());
    out.push(padding_len as u8);
    out.extend_from_slice(payload);

    let mut padding = vec![0u8; padding_len];
    rand::rng().fill_bytes(&mut padding);
    out.extend_from_slice(&padding);

    out
}

fn write_name_list(out: &mut Vec<u8>, list: &str) {
    out.extend_from_slice(&(list.len() as u32).to_be_bytes());
    out.extend_from_slice(list.as_bytes());
}

/// Builds a full `SSH_MSG_KEXINIT` packet: a 16-byte random cookie, ten
/// length-prefixed name-lists, `first_kex_packet_follows = 0`, and four
/// zero reserved bytes (spec §4.2 step 3).
pub fn build_kexinit() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(SSH_MSG_KEXINIT);

    let mut cookie = [0u8; 16];
    rand::rng().fill_bytes(&mut cookie);
    payload.extend_from_slice(&cookie);

    for list in [
        KEX_ALGORITHMS,
        HOST_KEY_ALGORITHMS,
        ENC_ALGORITHMS,
        ENC_ALGORITHMS,
        MAC_ALGORITHMS,
        MAC_ALGORITHMS,
        COMPRESSION_ALGORITHMS,
        COMPRESSION_ALGORITHMS,
        LANGUAGES,
        LANGUAGES,
    ] {
        write_name_list(&mut payload, list);
    }

    payload.push(0); // first_kex_packet_follows
    payload.extend_from_slice(&[0, 0, 0, 0]); // reserved

    frame_packet(&payload)
}

/// Builds an `SSH_MSG_USERAUTH_FAILURE` packet advertising `password,keyboard`
/// as the remaining auth methods, with `partial_success = false`
/// (spec §4.2 step 4).
pub fn build_auth_failure() -> Vec<u8> {
    const METHODS: &str = "password,keyboard";

    let mut payload = Vec::new();
    payload.push(SSH_MSG_USERAUTH_FAILURE);
    write_name_list(&mut payload, METHODS);
    payload.push(0); // partial success = false

    frame_packet(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed_length_field(packet: &[u8]) -> u32 {
        u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]])
    }

    #[test]
    fn framed_packet_length_field_matches_total_minus_header() {
        let packet = frame_packet(&[1, 2, 3]);
        let declared = framed_length_field(&packet) as usize;
        assert_eq!(packet.len(), 4 + declared);
    }

    #[test]
    fn framed_packet_is_multiple_of_eight_bytes() {
        for size in 0..40 {
            let payload = vec![0u8; size];
            let packet = frame_packet(&payload);
            assert_eq!(packet.len() % 8, 0, "failed at payload size {size}");
        }
    }

    #[test]
    fn padding_length_is_never_below_four() {
        let packet = frame_packet(&[]);
        let padding_len = packet[4];
        assert!(padding_len >= 4);
    }

    #[test]
    fn kexinit_starts_with_message_id() {
        let packet = build_kexinit();
        let padding_len = packet[4] as usize;
        let payload_start = 5;
        let payload_end = packet.len() - padding_len;
        assert_eq!(packet[payload_start], SSH_MSG_KEXINIT);
        assert!(payload_end > payload_start);
    }

    #[test]
    fn auth_failure_starts_with_message_id() {
        let packet = build_auth_failure();
        assert_eq!(packet[5], SSH_MSG_USERAUTH_FAILURE);
    }
}
