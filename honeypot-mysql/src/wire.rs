use rand::RngCore;

pub const MYSQL_PROTOCOL_VERSION: u8 = 10;
pub const MYSQL_SERVER_VERSION: &[u8] = b"5.7.38-0ubuntu0.18.04.1";

/// Wraps a payload in the MySQL packet header: a 3-byte little-endian
/// length followed by a 1-byte sequence id.
fn framed(payload: &[u8], sequence_id: u8) -> Vec<u8> {
    let len = payload.len() as u32;
    let len_bytes = len.to_le_bytes();
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&len_bytes[..3]);
    out.push(sequence_id);
    out.extend_from_slice(payload);
    out
}

/// Builds the Handshake V10 greeting sent immediately on connect, per
/// spec §4.5.
pub fn build_greeting_packet(connection_id: u32) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut packet = Vec::new();

    packet.push(MYSQL_PROTOCOL_VERSION);
    packet.extend_from_slice(MYSQL_SERVER_VERSION);
    packet.push(0);
    packet.extend_from_slice(&connection_id.to_le_bytes());

    let mut auth_part1 = [0u8; 8];
    rng.fill_bytes(&mut auth_part1);
    packet.extend_from_slice(&auth_part1);

    packet.push(0); // filler
    packet.extend_from_slice(&0xF7FFu16.to_le_bytes()); // capability flags, lower
    packet.push(33); // utf8
    packet.extend_from_slice(&0x0002u16.to_le_bytes()); // status flags
    packet.extend_from_slice(&0x0081u16.to_le_bytes()); // capability flags, upper
    packet.push(21); // length of auth plugin data
    packet.extend_from_slice(&[0u8; 10]); // reserved

    let mut auth_part2 = [0u8; 12];
    rng.fill_bytes(&mut auth_part2);
    packet.extend_from_slice(&auth_part2);
    packet.push(0);

    packet.extend_from_slice(b"mysql_native_password");
    packet.push(0);

    framed(&packet, 0)
}

/// Always framed with sequence id 2, matching the original honeypot's OK
/// packet builder, which hardcodes it regardless of call site.
pub fn build_ok_packet() -> Vec<u8> {
    let mut packet = Vec::new();
    packet.push(0x00); // OK header
    packet.push(0); // affected rows
    packet.push(0); // last insert id
    packet.extend_from_slice(&0x0002u16.to_le_bytes()); // status flags
    packet.extend_from_slice(&0u16.to_le_bytes()); // warnings
    framed(&packet, 2)
}

/// A single-column, zero-row result set: column count, one column
/// definition, and two EOF packets, per spec §4.5.
pub fn build_empty_result() -> Vec<u8> {
    let mut result = Vec::new();

    result.extend_from_slice(&[0x01, 0x00, 0x00, 0x01, 0x01]); // column count packet: 1 column

    let mut col_def = Vec::new();
    col_def.extend_from_slice(b"\x03def"); // catalog
    col_def.push(0); // schema
    col_def.push(0); // table
    col_def.push(0); // org_table
    col_def.extend_from_slice(b"\x06result"); // name
    col_def.push(0); // org_name
    col_def.push(0x0c); // length of fixed fields
    col_def.extend_from_slice(&33u16.to_le_bytes()); // charset
    col_def.extend_from_slice(&255u32.to_le_bytes()); // column length
    col_def.push(0xfd); // column type: varchar
    col_def.extend_from_slice(&0u16.to_le_bytes()); // flags
    col_def.push(0); // decimals
    col_def.extend_from_slice(&[0, 0]); // filler
    result.extend_from_slice(&framed(&col_def, 2));

    result.extend_from_slice(&[0x05, 0x00, 0x00, 0x03, 0xfe, 0x00, 0x00, 0x02, 0x00]); // EOF after column defs
    result.extend_from_slice(&[0x05, 0x00, 0x00, 0x04, 0xfe, 0x00, 0x00, 0x02, 0x00]); // EOF, no rows

    result
}

/// `SELECT`-prefixed queries get the canned empty result set; everything
/// else gets an OK packet (spec §4.5).
pub fn build_query_response(query: &str) -> Vec<u8> {
    if query.to_lowercase().trim_start().starts_with("select") {
        build_empty_result()
    } else {
        build_ok_packet()
    }
}

/// Extracts `(username, database)` from a client handshake response,
/// per spec §4.5's fixed 36-byte offset layout: 4-byte capability flags +
/// 4-byte max packet size + 1-byte charset + 23 reserved bytes, then a
/// NUL-terminated username, a length-prefixed auth response, and an
/// optional NUL-terminated database name.
pub fn parse_auth_packet(data: &[u8]) -> (String, String) {
    const OFFSET: usize = 36;
    if data.len() < OFFSET {
        return ("unknown".to_string(), String::new());
    }

    let username_end = match data[OFFSET..].iter().position(|&b| b == 0) {
        Some(pos) => OFFSET + pos,
        None => return ("unknown".to_string(), String::new()),
    };
    let username = String::from_utf8_lossy(&data[OFFSET..username_end]).into_owned();

    let mut offset = username_end + 1;
    if offset < data.len() {
        let auth_len = data[offset] as usize;
        offset += auth_len + 1;
    }

    let database = if offset < data.len() {
        match data[offset..].iter().position(|&b| b == 0) {
            Some(pos) => String::from_utf8_lossy(&data[offset..offset + pos]).into_owned(),
            None => String::new(),
        }
    } else {
        String::new()
    };

    (username, database)
}

/// Recognizes a `COM_QUERY` (`0x03`) command packet and returns its SQL
/// text. Anything else - including malformed or short packets - is `None`.
pub fn parse_query_packet(data: &[u8]) -> Option<String> {
    if data.len() < 5 {
        return None;
    }
    if data[4] != 0x03 {
        return None;
    }
    Some(String::from_utf8_lossy(&data[5..]).trim().to_string())
}
