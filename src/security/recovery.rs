use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SEGMENTS: usize = 4;
const SEGMENT_LEN: usize = 4;

/// Human-readable one-time key, `XXXX-XXXX-XXXX-XXXX` over `[A-Z0-9]`.
pub fn generate_recovery_key() -> String {
    let mut rng = rand::thread_rng();
    (0..SEGMENTS)
        .map(|_| {
            (0..SEGMENT_LEN)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Upper-case and trim user input so keys typed in lower case still match.
pub fn normalize_recovery_key(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_has_four_dash_separated_segments() {
        let key = generate_recovery_key();
        assert_eq!(key.len(), SEGMENTS * SEGMENT_LEN + SEGMENTS - 1);
        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), SEGMENTS);
        for part in parts {
            assert_eq!(part.len(), SEGMENT_LEN);
            assert!(part.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn keys_differ() {
        assert_ne!(generate_recovery_key(), generate_recovery_key());
    }

    #[test]
    fn normalize_uppercases() {
        assert_eq!(normalize_recovery_key(" ab12-cd34 \n"), "AB12-CD34");
    }
}
