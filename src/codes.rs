//! Short code generation and validation

use rand_core::OsRng;
use rand_core::RngCore;
use rand_core::TryRngCore;

/// Alphabet generated codes are drawn from
const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet length that fits in a byte
///
/// Bytes at or above it are rejected to keep the draw uniform
const REJECTION_LIMIT: u8 = (256 - 256 % ALPHABET.len()) as u8;

/// Default length of generated codes
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Maximum length of any code, generated or custom
pub const MAX_CODE_LENGTH: usize = 20;

/// Source of new short codes
///
/// Implementations do not interact with storage, uniqueness is enforced on insert
pub trait Generator: Send + Sync + 'static {
    /// Generate a code of exactly `length` characters
    fn generate(&self, length: usize) -> String;
}

/// Generator backed by the operating system's secure random source
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomGenerator;

impl Generator for RandomGenerator {
    fn generate(&self, length: usize) -> String {
        generate(length)
    }
}

/// Generate a random alphanumeric code of `length` characters
///
/// Panics when the operating system's random source fails, nothing sensible can be done then
pub fn generate(length: usize) -> String {
    let mut rng = OsRng.unwrap_err();
    let mut code = String::with_capacity(length);
    let mut buffer = [0u8; 32];

    while code.len() < length {
        rng.fill_bytes(&mut buffer);

        for byte in buffer {
            if byte >= REJECTION_LIMIT {
                continue;
            }

            code.push(char::from(ALPHABET[usize::from(byte) % ALPHABET.len()]));

            if code.len() == length {
                break;
            }
        }
    }

    code
}

/// Is the code acceptable as a short code?
///
/// Codes are 1 to [`MAX_CODE_LENGTH`] ASCII letters or digits
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code.chars().all(|ch| ch.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_length() {
        assert_eq!(generate(DEFAULT_CODE_LENGTH).len(), DEFAULT_CODE_LENGTH);
        assert_eq!(generate(1).len(), 1);
        assert_eq!(generate(MAX_CODE_LENGTH).len(), MAX_CODE_LENGTH);
        assert_eq!(generate(0), "");
    }

    #[test]
    fn test_generate_alphabet() {
        let code = generate(2000);

        assert!(code.bytes().all(|byte| ALPHABET.contains(&byte)));
        assert!(is_valid_code(&code[..MAX_CODE_LENGTH]));
    }

    #[test]
    fn test_generate_spread() {
        // 62^8 possibilities, a repeat in a thousand draws means a broken source
        let codes = (0..1000)
            .map(|_| RandomGenerator.generate(DEFAULT_CODE_LENGTH))
            .collect::<HashSet<String>>();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("abc123"));
        assert!(is_valid_code("A"));
        assert!(is_valid_code(&"a".repeat(MAX_CODE_LENGTH)));

        assert!(!is_valid_code(""));
        assert!(!is_valid_code(&"a".repeat(MAX_CODE_LENGTH + 1)));
        assert!(!is_valid_code("abc-123"));
        assert!(!is_valid_code("abc 123"));
        assert!(!is_valid_code("abc/123"));
        assert!(!is_valid_code("äbc"));
    }
}
