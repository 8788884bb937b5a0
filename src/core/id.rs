//! Purpose: Generate opaque book identifiers.
//! Exports: `generate`, `ID_LEN`.
//! Invariants: Ids are `ID_LEN` characters from a 64-symbol URL-safe alphabet.
//! Invariants: Randomness comes from the OS RNG; callers handle collisions.

use getrandom::fill as fill_random;

use super::error::{Error, ErrorKind};

pub const ID_LEN: usize = 16;

const ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

pub fn generate() -> Result<String, Error> {
    let mut bytes = [0u8; ID_LEN];
    fill_random(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal).with_message(format!("failed to generate book id: {err}"))
    })?;
    // 64 symbols: masking keeps the distribution uniform.
    Ok(bytes
        .iter()
        .map(|byte| ALPHABET[(byte & 63) as usize] as char)
        .collect())
}
