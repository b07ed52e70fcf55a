//! Base64 encoding and strict decoding (RFC 4648).
//!
//! Encoding always emits `=` padding, with either the standard or the
//! URL-safe alphabet. Decoding accepts the standard (`+`, `/`) and URL-safe
//! (`-`, `_`) symbols for values 62 and 63 interchangeably and rejects
//! everything else: lengths that are not a multiple of 4, bytes outside the
//! alphabet, misplaced padding and non-zero bits in a padded final symbol.
//!
//! # Example
//!
//! ```
//! use strict_base64::{decode, encode, encode_url_safe};
//!
//! assert_eq!(encode(b"Man"), "TWFu");
//! assert_eq!(encode_url_safe(&[0xff, 0xff, 0xff]), "____");
//! assert_eq!(decode("TWE=").unwrap(), b"Ma");
//! assert!(decode("A=AA").is_err());
//! ```

use thiserror::Error;

#[cfg(test)]
#[path = "base64_tests.rs"]
mod tests;

/// Standard base64 alphabet (RFC 4648).
pub const ALPHABET_STANDARD: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// URL-safe base64 alphabet (RFC 4648).
pub const ALPHABET_URL: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Padding character.
pub const PAD: u8 = b'=';

const MAX_PADDING: usize = 2;

const INVALID: u8 = 0xff;
const PADDING: u8 = 0xfe;

/// Decode table shared by both alphabets. `=` maps to a marker whose
/// validity depends on its position.
static DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET_STANDARD[i] as usize] = i as u8;
        table[ALPHABET_URL[i] as usize] = i as u8;
        i += 1;
    }
    table[PAD as usize] = PADDING;
    table
}

/// Alphabet used when encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alphabet {
    /// `A-Z a-z 0-9 + /`
    #[default]
    Standard,
    /// `A-Z a-z 0-9 - _`
    UrlSafe,
}

impl Alphabet {
    /// The 64 symbols of this alphabet, indexed by value.
    pub const fn symbols(self) -> &'static [u8; 64] {
        match self {
            Alphabet::Standard => ALPHABET_STANDARD,
            Alphabet::UrlSafe => ALPHABET_URL,
        }
    }
}

/// Error type for base64 decoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The input length is not a multiple of 4.
    #[error("invalid input length {0}: must be a multiple of 4")]
    InvalidLength(usize),

    /// A byte outside the alphabet, or `=` outside the trailing padding.
    #[error("invalid byte 0x{byte:02x} at offset {index}")]
    InvalidCharacter { index: usize, byte: u8 },

    /// The last data symbol before the padding carries bits that do not
    /// belong to any decoded byte.
    #[error("non-zero trailing bits in symbol at offset {index}")]
    InvalidTrailingBits { index: usize },

    /// The output buffer cannot hold the decoded bytes.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Calculates the padded encoded length for `len` input bytes.
///
/// ```
/// use strict_base64::encoded_len;
///
/// assert_eq!(encoded_len(0), 0);
/// assert_eq!(encoded_len(1), 4);
/// assert_eq!(encoded_len(4), 8);
/// ```
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Calculates how many bytes `input` decodes to, without validating its
/// symbols.
///
/// Fails only when the length is not a multiple of 4. Use it to size the
/// buffer handed to [`decode_into`].
///
/// ```
/// use strict_base64::decoded_len;
///
/// assert_eq!(decoded_len("TWFu"), Ok(3));
/// assert_eq!(decoded_len("TQ=="), Ok(1));
/// assert!(decoded_len("TWF").is_err());
/// ```
pub fn decoded_len(input: impl AsRef<[u8]>) -> Result<usize, Error> {
    let input = input.as_ref();
    if !input.len().is_multiple_of(4) {
        return Err(Error::InvalidLength(input.len()));
    }

    // n is a multiple of 4 and padding is at most 2, so this cannot underflow.
    Ok(input.len() / 4 * 3 - padding_len(input))
}

/// Probes the last three bytes for `=`, from the end, stopping at the first
/// other byte. A third `=` does not widen the padding zone, which leaves it
/// to be rejected as a misplaced character.
fn padding_len(input: &[u8]) -> usize {
    input
        .iter()
        .rev()
        .take(3)
        .take_while(|&&b| b == PAD)
        .count()
        .min(MAX_PADDING)
}

/// Encodes binary data with the standard alphabet and `=` padding.
///
/// # Example
///
/// ```
/// use strict_base64::encode;
///
/// assert_eq!(encode(b""), "");
/// assert_eq!(encode(b"M"), "TQ==");
/// assert_eq!(encode(b"Ma"), "TWE=");
/// assert_eq!(encode(b"Man"), "TWFu");
/// ```
pub fn encode(data: &[u8]) -> String {
    encode_with(data, Alphabet::Standard)
}

/// Encodes binary data with the URL-safe alphabet and `=` padding.
///
/// The output is the standard encoding with `+` replaced by `-` and `/`
/// replaced by `_`.
///
/// # Example
///
/// ```
/// use strict_base64::encode_url_safe;
///
/// assert_eq!(encode_url_safe(&[0xfb, 0xff]), "-_8=");
/// ```
pub fn encode_url_safe(data: &[u8]) -> String {
    encode_with(data, Alphabet::UrlSafe)
}

/// Encodes binary data with the given alphabet.
pub fn encode_with(data: &[u8], alphabet: Alphabet) -> String {
    let mut output = Vec::new();
    encode_to_vec(&mut output, data, alphabet);
    String::from_utf8(output).expect("base64 output is always valid UTF-8")
}

/// Encodes binary data into `out`, replacing its contents and reusing its
/// allocation.
///
/// # Example
///
/// ```
/// use strict_base64::{encode_to_string, Alphabet};
///
/// let mut out = String::from("stale");
/// encode_to_string(b"Man", Alphabet::Standard, &mut out);
/// assert_eq!(out, "TWFu");
/// ```
pub fn encode_to_string(data: &[u8], alphabet: Alphabet, out: &mut String) {
    let mut output = std::mem::take(out).into_bytes();
    encode_to_vec(&mut output, data, alphabet);
    *out = String::from_utf8(output).expect("base64 output is always valid UTF-8");
}

fn encode_to_vec(output: &mut Vec<u8>, data: &[u8], alphabet: Alphabet) {
    output.clear();
    output.resize(encoded_len(data.len()), 0);
    encode_to_slice(output, data, ALPHABET_STANDARD);
    if alphabet == Alphabet::UrlSafe {
        to_url_safe(output);
    }
}

/// Writes the padded encoding of `data` into `output`, which must be exactly
/// `encoded_len(data.len())` bytes long.
fn encode_to_slice(output: &mut [u8], data: &[u8], symbols: &[u8; 64]) {
    debug_assert_eq!(output.len(), encoded_len(data.len()));

    let mut chunks = data.chunks_exact(3);
    let mut out_idx = 0;

    for chunk in &mut chunks {
        let (b0, b1, b2) = (chunk[0], chunk[1], chunk[2]);
        output[out_idx] = symbols[(b0 >> 2) as usize];
        output[out_idx + 1] = symbols[(((b0 << 4) | (b1 >> 4)) & 0x3f) as usize];
        output[out_idx + 2] = symbols[(((b1 << 2) | (b2 >> 6)) & 0x3f) as usize];
        output[out_idx + 3] = symbols[(b2 & 0x3f) as usize];
        out_idx += 4;
    }

    match *chunks.remainder() {
        [b0, b1] => {
            output[out_idx] = symbols[(b0 >> 2) as usize];
            output[out_idx + 1] = symbols[(((b0 << 4) | (b1 >> 4)) & 0x3f) as usize];
            output[out_idx + 2] = symbols[((b1 << 2) & 0x3f) as usize];
            output[out_idx + 3] = PAD;
        }
        [b0] => {
            output[out_idx] = symbols[(b0 >> 2) as usize];
            output[out_idx + 1] = symbols[((b0 << 4) & 0x3f) as usize];
            output[out_idx + 2] = PAD;
            output[out_idx + 3] = PAD;
        }
        _ => {}
    }
}

/// Rewrites standard symbols 62 and 63 to their URL-safe forms in place.
fn to_url_safe(encoded: &mut [u8]) {
    for symbol in encoded.iter_mut() {
        match *symbol {
            b'+' => *symbol = b'-',
            b'/' => *symbol = b'_',
            _ => {}
        }
    }
}

/// Decodes a base64 string into a freshly allocated buffer.
///
/// Both alphabets are accepted, even mixed within one input. Empty input
/// decodes to an empty buffer.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if the length is not a multiple of 4,
/// [`Error::InvalidCharacter`] for a byte outside the alphabet or a `=`
/// before the final padding, and [`Error::InvalidTrailingBits`] when the
/// last data symbol is not the canonical one.
///
/// # Example
///
/// ```
/// use strict_base64::{decode, Error};
///
/// assert_eq!(decode("TWFu").unwrap(), b"Man");
/// assert_eq!(decode("QQ==").unwrap(), b"A");
/// assert_eq!(decode("TWF"), Err(Error::InvalidLength(3)));
/// assert_eq!(decode("TW=="), Err(Error::InvalidTrailingBits { index: 1 }));
/// ```
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, Error> {
    let input = input.as_ref();
    decode_to_vec(input).inspect_err(|err| log_rejection(input, err))
}

/// Decodes a base64 string into a caller-provided buffer and returns the
/// number of bytes written.
///
/// The buffer must hold at least [`decoded_len`] bytes; the capacity check
/// runs before any symbol is examined. On error the buffer contents are
/// unspecified.
///
/// # Errors
///
/// Same as [`decode`], plus [`Error::BufferTooSmall`].
///
/// # Example
///
/// ```
/// use strict_base64::{decode_into, Error};
///
/// let mut buf = [0u8; 4];
/// assert_eq!(decode_into(&mut buf, "TWE="), Ok(2));
/// assert_eq!(&buf[..2], b"Ma");
///
/// let mut small = [0u8; 2];
/// assert_eq!(
///     decode_into(&mut small, "TWFu"),
///     Err(Error::BufferTooSmall { needed: 3, available: 2 })
/// );
/// ```
pub fn decode_into(output: &mut [u8], input: impl AsRef<[u8]>) -> Result<usize, Error> {
    let input = input.as_ref();
    decode_slice(output, input).inspect_err(|err| log_rejection(input, err))
}

fn log_rejection(input: &[u8], err: &Error) {
    tracing::trace!("rejecting base64 input of {} bytes: {}", input.len(), err);
}

fn decode_to_vec(input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut output = vec![0u8; decoded_len(input)?];
    let written = decode_slice(&mut output, input)?;
    debug_assert_eq!(written, output.len());
    Ok(output)
}

fn decode_slice(output: &mut [u8], input: &[u8]) -> Result<usize, Error> {
    let out_len = decoded_len(input)?;
    if output.len() < out_len {
        return Err(Error::BufferTooSmall {
            needed: out_len,
            available: output.len(),
        });
    }

    let padding_start = input.len() - padding_len(input);
    let mut written = 0;

    for (group_idx, group) in input.chunks_exact(4).enumerate() {
        let mut accum = 0u32;
        for (offset, &byte) in group.iter().enumerate() {
            let index = group_idx * 4 + offset;
            let value = match DECODE_TABLE[byte as usize] {
                PADDING if index >= padding_start => 0,
                PADDING | INVALID => return Err(Error::InvalidCharacter { index, byte }),
                value => value,
            };
            accum = (accum << 6) | u32::from(value);
        }

        let bytes = [(accum >> 16) as u8, (accum >> 8) as u8, accum as u8];
        // Fewer than 3 only in a padded final group.
        let take = (out_len - written).min(3);
        output[written..written + take].copy_from_slice(&bytes[..take]);
        written += take;

        if bytes[take..].iter().any(|&b| b != 0) {
            return Err(Error::InvalidTrailingBits {
                index: padding_start - 1,
            });
        }
    }

    Ok(written)
}
