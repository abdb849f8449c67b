//! Cache key derivation.
//!
//! A raw key joins the function identity and the rendered arguments with the
//! unit-separator byte, escaping that byte inside segments so the join stays
//! injective over rendered segments. The raw key is then normalized to a
//! fixed-width SHA-256 hex fingerprint, which is what the store sees.

use crate::args::Args;
use crate::error::Result;
use sha2::{Digest, Sha256};

/// Delimiter between the function identity and each rendered argument.
const KEY_DELIMITER: char = '\u{1f}';

/// Escape the delimiter (and the escape character itself) inside a rendered
/// segment, so distinct segment lists always join to distinct raw keys.
fn escape_segment(segment: &str) -> String {
    segment.replace('\\', "\\\\").replace(KEY_DELIMITER, "\\x1f")
}

/// Build the raw (pre-fingerprint) cache key for a function identity and its
/// ordered argument list.
///
/// Equal inputs always yield an equal key. Distinct rendered argument lists
/// yield distinct keys; distinctness of the rendering itself follows the
/// argument serialization rules in [`crate::args::ArgValue::render`].
pub fn build_raw_key(unique_fn_id: &str, args: &Args) -> Result<String> {
    let mut raw = escape_segment(unique_fn_id);
    for arg in args {
        raw.push(KEY_DELIMITER);
        raw.push_str(&escape_segment(&arg.render()?));
    }
    Ok(raw)
}

/// Normalize a raw key to the fixed-width fingerprint used as the store key.
pub fn fingerprint(raw_key: &str) -> String {
    let digest = Sha256::digest(raw_key.as_bytes());
    hex::encode(digest)
}

/// Build the store-ready cache key in one step.
pub fn build_key(unique_fn_id: &str, args: &Args) -> Result<String> {
    Ok(fingerprint(&build_raw_key(unique_fn_id, args)?))
}
