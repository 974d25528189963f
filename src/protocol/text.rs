//! Short-message payload decoding by `data_coding` scheme.

use super::command::data_coding;

/// GSM 03.38 default alphabet, one entry per septet value. Decoding here
/// is byte-per-character (unpacked septets); packed GSM-7 is out of scope.
const GSM7_BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Characters reached through the 0x1B escape in the extension table.
fn gsm7_extension(byte: u8) -> Option<char> {
    match byte {
        0x0A => Some('\u{0C}'),
        0x14 => Some('^'),
        0x28 => Some('{'),
        0x29 => Some('}'),
        0x2F => Some('\\'),
        0x3C => Some('['),
        0x3D => Some('~'),
        0x3E => Some(']'),
        0x40 => Some('|'),
        0x65 => Some('€'),
        _ => None,
    }
}

/// Decode a short message per its `data_coding` value.
///
/// Unsupported codings and malformed payloads fall back to a lossy byte
/// passthrough rather than erroring; the raw bytes always survive in the
/// PDU for callers that need them.
pub fn decode_short_message(data_coding_value: u8, bytes: &[u8]) -> String {
    match data_coding_value {
        data_coding::GSM7 => decode_gsm7(bytes),
        data_coding::ASCII => bytes.iter().map(|&b| (b & 0x7F) as char).collect(),
        data_coding::LATIN1 => decode_latin1(bytes),
        data_coding::BINARY_8BIT_A | data_coding::BINARY_8BIT => decode_lossy(bytes),
        data_coding::UCS2 => decode_ucs2(bytes),
        _ => decode_lossy(bytes),
    }
}

fn decode_gsm7(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut escaped = false;
    for &b in bytes {
        if escaped {
            escaped = false;
            match gsm7_extension(b) {
                Some(c) => out.push(c),
                // GSM 03.38 renders an unknown escape as NBSP.
                None => out.push('\u{A0}'),
            }
            continue;
        }
        match b {
            0x1B => escaped = true,
            b if b < 0x80 => out.push(GSM7_BASIC[b as usize]),
            b => out.push(b as char), // out-of-alphabet byte, pass through
        }
    }
    out
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_ucs2(bytes: &[u8]) -> String {
    if bytes.len() % 2 != 0 {
        return decode_lossy(bytes);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    match String::from_utf16(&units) {
        Ok(s) => s,
        Err(_) => decode_lossy(bytes),
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::data_coding;

    #[test]
    fn gsm7_plain_ascii_subset() {
        let decoded = decode_short_message(data_coding::GSM7, b"Hello 123");
        assert_eq!(decoded, "Hello 123");
    }

    #[test]
    fn gsm7_special_characters() {
        // 0x00 = '@', 0x02 = '$'
        let decoded = decode_short_message(data_coding::GSM7, &[0x00, 0x02]);
        assert_eq!(decoded, "@$");
    }

    #[test]
    fn gsm7_extension_escape() {
        // ESC 0x65 = euro sign, ESC 0x28 = '{'
        let decoded = decode_short_message(data_coding::GSM7, &[0x1B, 0x65, 0x1B, 0x28]);
        assert_eq!(decoded, "€{");
    }

    #[test]
    fn latin1_high_bytes() {
        let decoded = decode_short_message(data_coding::LATIN1, &[0x48, 0xE9]);
        assert_eq!(decoded, "Hé");
    }

    #[test]
    fn ucs2_big_endian() {
        let decoded = decode_short_message(data_coding::UCS2, &[0x00, 0x48, 0x00, 0x69]);
        assert_eq!(decoded, "Hi");
    }

    #[test]
    fn ucs2_odd_length_falls_back() {
        let decoded = decode_short_message(data_coding::UCS2, &[0x48, 0x69, 0x21]);
        assert_eq!(decoded, "Hi!");
    }

    #[test]
    fn unknown_coding_falls_back_to_raw() {
        let decoded = decode_short_message(0x7F, b"raw bytes");
        assert_eq!(decoded, "raw bytes");
    }
}
