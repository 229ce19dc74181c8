//! Maps an untrusted, still percent-encoded request path onto the data root.
//!
//! The order of operations is fixed: decode once, strip one leading `/`, join
//! onto the root, normalize, then bounds-check. The decoded string is never
//! decoded again, so `%252e%252e` ends up as the literal name `%2e%2e`.

use crate::{errors::DecodeError, security};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Outcome of resolving one request path. Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub candidate_path: PathBuf,
    pub decoded_relative: String,
    pub authorized: bool,
}

impl Resolution {
    fn denied(root: &Path) -> Self {
        Self {
            candidate_path: root.to_path_buf(),
            decoded_relative: String::new(),
            authorized: false,
        }
    }
}

/// Resolve `raw` against `root`, which must already be canonical and absolute.
pub fn resolve(raw: &str, root: &Path) -> Resolution {
    let decoded = match decode_request_path(raw) {
        Ok(decoded) => decoded,
        Err(_) => return Resolution::denied(root),
    };
    let relative = decoded.strip_prefix('/').unwrap_or(&decoded);

    // an absolute remainder (`//etc/passwd`) replaces the root, like path.resolve
    let candidate_path = security::normalize_lexical(&root.join(relative));
    let authorized = security::is_within_root(&candidate_path, root);

    Resolution {
        candidate_path,
        decoded_relative: relative.to_string(),
        authorized,
    }
}

/// Percent-decode exactly once, rejecting anything `decodeURIComponent` would.
///
/// `percent_decode_str` passes malformed escapes such as `%zz` or a trailing
/// `%` through verbatim, so they are caught by a scan before decoding.
pub fn decode_request_path(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    let mut from = 0;
    while let Some(pos) = bytes[from..].iter().position(|&b| b == b'%') {
        let at = from + pos;
        match bytes.get(at + 1..at + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => from = at + 3,
            _ => return Err(DecodeError::MalformedEscape { offset: at }),
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| DecodeError::InvalidUtf8)
}
