//! Subject pattern translation.
//!
//! Subscribers write patterns in pub/sub wildcard syntax: `*` matches one
//! token and a trailing `>` matches the rest of the subject. The trie works
//! on named wildcards instead, so every pattern is rewritten once at
//! registration:
//!
//! | pattern       | translated          |
//! |---------------|---------------------|
//! | `user.>`      | `user.*>`           |
//! | `user.*.*.>`  | `user.:p1.:p2.*>`   |
//! | `user.:name`  | `user.:name`        |

/// Token separator in subjects.
pub const SEPARATOR: char = '.';

/// Name of the parameter captured by a trailing `>`.
pub const CATCH_ALL_PARAM: &str = ">";

/// Rewrite pub/sub wildcard syntax into the trie's token grammar.
///
/// Each `.*` becomes `.:pN`, counting from 1 within this call, and a
/// trailing `.>` becomes `.*>`. Named `:name` tokens pass through. No other
/// validation happens here; malformed patterns are rejected on insertion.
pub fn translate(pattern: &str) -> String {
    let (body, catch_all) = match pattern.strip_suffix(".>") {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let mut out = String::with_capacity(pattern.len() + 8);
    let mut counter = 0_usize;
    let mut rest = body;
    while let Some(at) = rest.find(".*") {
        counter += 1;
        out.push_str(&rest[..at]);
        out.push_str(".:p");
        out.push_str(&counter.to_string());
        rest = &rest[at + 2..];
    }
    out.push_str(rest);

    if catch_all {
        out.push_str(".*");
        out.push_str(CATCH_ALL_PARAM);
    }
    out
}

/// Number of named wildcards and catch-alls in a translated pattern.
///
/// Used to size parameter buffers, not for matching.
pub fn count_params(pattern: &str) -> usize {
    pattern.bytes().filter(|&b| b == b':' || b == b'*').count()
}
