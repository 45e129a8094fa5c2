//! PrivMail's character encoding and the Base64 bookkeeping that rides on top
//! of it.
//!
//! Only the low 6 bits of every 8-bit wire bundle carry semantic payload;
//! the high 2 bits exist purely because the transport and the bucket-file
//! builder work byte-wise.

/// Number of payload bits per PrivMail character. Comparisons restrict to
/// these bits only — the top 2 bits of every byte are never compared.
pub const CHARACTER_BITLEN: usize = 6;

/// Number of bits in a wire bundle as it arrives from the input decoder.
pub const BYTE_BITLEN: usize = 8;

/// `3 * (len(base64) / 4) - padding`, the character-length law used for the
/// `keyword_characters` / `email_characters` statistics counters.
///
/// ```
/// use privmail_engine::encoding::base64_char_len;
/// assert_eq!(base64_char_len("AAAA"), 3);
/// assert_eq!(base64_char_len("AAA="), 2);
/// assert_eq!(base64_char_len("AA=="), 1);
/// assert_eq!(base64_char_len(""), 0);
/// ```
pub fn base64_char_len(b64: &str) -> usize {
    let pad = b64.bytes().rev().take_while(|&b| b == b'=').count();
    3 * (b64.len() / 4) - pad.min(3 * (b64.len() / 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_law() {
        assert_eq!(base64_char_len("AAAA"), 3);
        assert_eq!(base64_char_len("AAA="), 2);
        assert_eq!(base64_char_len("AA=="), 1);
        assert_eq!(base64_char_len(""), 0);
    }

    #[test]
    fn char_len_multi_block() {
        assert_eq!(base64_char_len("AAAAAAAA"), 6);
        assert_eq!(base64_char_len("AAAAAAA="), 5);
    }
}
