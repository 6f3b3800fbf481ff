//! Link identifier generation.

/// Length of random bytes before hex encoding.
const ID_LENGTH_BYTES: usize = 12;

/// Generates a random link identifier.
///
/// Uses `getrandom` for entropy and encodes the result as lowercase hex,
/// producing a 24-character identifier.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_link_id() -> String {
    let mut buffer = [0u8; ID_LENGTH_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    hex::encode(buffer)
}

/// Returns true if `id` has the shape produced by [`generate_link_id`].
pub fn is_link_id(id: &str) -> bool {
    id.len() == ID_LENGTH_BYTES * 2 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
