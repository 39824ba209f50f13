//! Subsonic token authentication
//!
//! Every request carries `t = MD5(password + salt)` with a fresh random salt,
//! so each generated stream URL is signed independently of the others.

use md5::{Digest, Md5};
use rand::Rng;

/// API version to use for requests
pub const API_VERSION: &str = "1.16.1";

/// Client identifier
pub const CLIENT_NAME: &str = "tunedl";

const SALT_LEN: usize = 16;

/// Generate authentication parameters for Subsonic API requests
///
/// Returns (key, value) pairs for the query string:
/// - u: username
/// - t: token (MD5 hash of password + salt)
/// - s: random salt
/// - v: API version
/// - c: client identifier
/// - f: response format (json)
pub fn generate_auth_params(username: &str, password: &str) -> Vec<(&'static str, String)> {
    let salt = generate_salt();
    let token = generate_token(password, &salt);

    vec![
        ("u", username.to_string()),
        ("t", token),
        ("s", salt),
        ("v", API_VERSION.to_string()),
        ("c", CLIENT_NAME.to_string()),
        ("f", "json".to_string()),
    ]
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

fn generate_token(password: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}
