//! Classroom join-code generation.
//!
//! Generated codes are random, not verified against existing classrooms.
//! Collisions are possible in principle and accepted.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Prefix of every generated join-code.
pub const JOIN_CODE_PREFIX: &str = "EDU-";
/// Number of random characters after the prefix.
pub const JOIN_CODE_RANDOM_LEN: usize = 8;

static GENERATED_JOIN_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^EDU-[0-9A-Z]{8}$").expect("valid join code regex"));

/// Generates a fresh join-code such as `EDU-3F9A01BC`.
///
/// The random part is the head of a v4 UUID in simple form, uppercased.
pub fn generate_join_code() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{JOIN_CODE_PREFIX}{}",
        random[..JOIN_CODE_RANDOM_LEN].to_ascii_uppercase()
    )
}

/// Returns whether `code` has the shape produced by [`generate_join_code`].
pub fn is_generated_join_code(code: &str) -> bool {
    GENERATED_JOIN_CODE_RE.is_match(code)
}
