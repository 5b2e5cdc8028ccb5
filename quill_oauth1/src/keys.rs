//! Random key material for consumers and tokens.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of an auto-generated consumer key.
pub const CONSUMER_KEY_LENGTH: usize = 12;
/// Length of a request or access token key.
pub const TOKEN_KEY_LENGTH: usize = 24;
/// Length of every generated secret.
pub const SECRET_LENGTH: usize = 48;

/// Generates a random alphanumeric key of the given length.
pub fn generate_key(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generates a random alphanumeric secret of the given length.
pub fn generate_secret(length: usize) -> String {
    generate_key(length)
}
