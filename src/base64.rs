//! Base64 encoding for SMTP AUTH LOGIN credentials and MIME attachments.

/// RFC 4648 standard alphabet.
const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode arbitrary bytes as Base64 with `=` padding.
///
/// The output is a single unbroken line; MIME bodies are sent without the
/// 76-column wrapping some encoders apply.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    let mut chunks = data.chunks_exact(3);
    for chunk in &mut chunks {
        let fields = [
            chunk[0] >> 2,
            (chunk[0] & 0x03) << 4 | chunk[1] >> 4,
            (chunk[1] & 0x0f) << 2 | chunk[2] >> 6,
            chunk[2] & 0x3f,
        ];
        for field in fields {
            out.push(BASE64_CHARS[field as usize] as char);
        }
    }

    // Trailing group of 1 or 2 bytes: zero-pad to extract the fields, emit
    // only the characters backed by real input bits, then pad with '='.
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let b0 = rest[0];
        let b1 = rest.get(1).copied().unwrap_or(0);
        let fields = [
            b0 >> 2,
            (b0 & 0x03) << 4 | b1 >> 4,
            (b1 & 0x0f) << 2,
        ];
        for field in &fields[..rest.len() + 1] {
            out.push(BASE64_CHARS[*field as usize] as char);
        }
        for _ in rest.len() + 1..4 {
            out.push('=');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test-only decoder used to verify the round-trip law.
    fn decode(encoded: &str) -> Vec<u8> {
        let mut out = Vec::new();
        let mut acc: u32 = 0;
        let mut bits = 0;
        for c in encoded.bytes() {
            if c == b'=' {
                break;
            }
            let value = BASE64_CHARS.iter().position(|&b| b == c).unwrap() as u32;
            acc = acc << 6 | value;
            bits += 6;
            if bits >= 8 {
                bits -= 8;
                out.push((acc >> bits) as u8);
            }
        }
        out
    }

    #[test]
    fn test_rfc4648_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foob"), "Zm9vYg==");
        assert_eq!(encode(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn test_output_length_multiple_of_four() {
        for len in 1..32 {
            let data: Vec<u8> = (0..len as u8).collect();
            let encoded = encode(&data);
            assert!(!encoded.is_empty());
            assert_eq!(encoded.len() % 4, 0, "length {} not padded", len);
        }
    }

    #[test]
    fn test_round_trip() {
        let samples: Vec<Vec<u8>> = vec![
            vec![],
            vec![0],
            vec![0xff],
            vec![0, 0xff, 0x7f],
            b"any carnal pleasure.".to_vec(),
            (0..=255).collect(),
        ];
        for sample in samples {
            assert_eq!(decode(&encode(&sample)), sample);
        }
    }

    #[test]
    fn test_binary_not_line_wrapped() {
        // 300 bytes encodes to 400 characters; no newlines are inserted.
        let data = vec![0xabu8; 300];
        let encoded = encode(&data);
        assert_eq!(encoded.len(), 400);
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
    }
}
