//! Base62 codec for counter-derived short codes.
//!
//! The alphabet order is digits, then uppercase, then lowercase. Encoded
//! strings therefore do not sort in numeric order once they exceed one
//! symbol; callers must not rely on lexicographic ordering of codes.

/// Symbol table, indexed by digit value.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = ALPHABET.len() as u64;

/// Errors returned by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Base62Error {
    #[error("invalid character '{ch}' at position {position} in base62 string")]
    InvalidCharacter { ch: char, position: usize },

    #[error("base62 value does not fit in 64 bits")]
    Overflow,

    #[error("empty base62 string")]
    Empty,
}

/// Encodes a non-negative integer as base62.
///
/// # Examples
///
/// ```
/// use seq_shortener::utils::base62::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    // u64::MAX needs 11 symbols
    let mut buf = [0u8; 11];
    let mut pos = buf.len();

    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a base62 string produced by [`encode`].
///
/// # Errors
///
/// - [`Base62Error::InvalidCharacter`] if a symbol is outside the alphabet
/// - [`Base62Error::Overflow`] if the value exceeds `u64::MAX`
/// - [`Base62Error::Empty`] for the empty string
pub fn decode(s: &str) -> Result<u64, Base62Error> {
    if s.is_empty() {
        return Err(Base62Error::Empty);
    }

    s.chars().enumerate().try_fold(0u64, |acc, (position, ch)| {
        let digit = digit_value(ch).ok_or(Base62Error::InvalidCharacter { ch, position })?;
        acc.checked_mul(BASE)
            .and_then(|v| v.checked_add(digit))
            .ok_or(Base62Error::Overflow)
    })
}

fn digit_value(ch: char) -> Option<u64> {
    let value = match ch {
        '0'..='9' => ch as u64 - '0' as u64,
        'A'..='Z' => ch as u64 - 'A' as u64 + 10,
        'a'..='z' => ch as u64 - 'a' as u64 + 36,
        _ => return None,
    };
    Some(value)
}
