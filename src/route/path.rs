//! Route path normalization
//!
//! Every registered path is absolute, has exactly one leading separator and no
//! trailing separator (the root path `/` excepted). A controller prefix is
//! normalized the same way and prepended, with a root route path contributing
//! nothing: prefix `/test/` and path `/` register at `/test`.

use crate::errors::{LoadError, LoadResult};

const SEPARATOR: char = '/';

/// Normalize a single path: leading separator, collapsed separator runs, no
/// trailing separator unless the result is the root.
fn normalize_segment(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for part in path.split(SEPARATOR).filter(|p| !p.is_empty()) {
        out.push(SEPARATOR);
        out.push_str(part);
    }
    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}

/// Combine an optional controller prefix with a route path.
///
/// # Errors
///
/// Returns [`LoadError::InvalidPrefix`] when a non-empty prefix normalizes to
/// the bare root, since every route of that controller would collide with the
/// root namespace.
pub fn normalize(prefix: Option<&str>, path: &str) -> LoadResult<String> {
    let path = normalize_segment(path);

    let prefix = match prefix {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(path),
    };

    let prefix_norm = normalize_segment(prefix);
    if prefix_norm.len() == 1 {
        return Err(LoadError::InvalidPrefix(prefix.to_string()));
    }

    if path.len() == 1 {
        Ok(prefix_norm)
    } else {
        Ok(prefix_norm + &path)
    }
}

/// Rewrite Express-style parameters into axum's path syntax.
///
/// `:id` becomes `{id}` and a bare `*` becomes `{*wildcard}`; segments already
/// written for axum pass through unchanged.
pub fn router_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    let mut out = String::with_capacity(path.len() + 4);
    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        out.push(SEPARATOR);
        if let Some(name) = segment.strip_prefix(':') {
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if segment == "*" {
            out.push_str("{*wildcard}");
        } else if let Some(name) = segment.strip_prefix('*') {
            out.push_str("{*");
            out.push_str(name);
            out.push('}');
        } else {
            out.push_str(segment);
        }
    }
    out
}
