//! URI codec: split/join the scheme-host-path-query-fragment form used as node identity.
//!
//! Parses `<scheme>://<host><path>[?<query>][#<fragment>]` where scheme matches
//! `[A-Za-z+_-]+`, host is any run of non-`/` characters (possibly empty), and
//! path begins with `/` and runs to the next `?`, `#`, or end of string.

use std::fmt;

use crate::error::UriError;

/// A parsed node identity. Equality is URI equality: two `Uri`s are equal iff
/// every part is equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Uri {
    /// Parses a URI string into its five parts.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| UriError::Malformed(input.to_string()))?;
        if scheme.is_empty() || !scheme.chars().all(is_scheme_char) {
            return Err(UriError::Malformed(input.to_string()));
        }

        let path_start = rest
            .find('/')
            .ok_or_else(|| UriError::Malformed(input.to_string()))?;
        let host = &rest[..path_start];
        let after_host = &rest[path_start..];

        let (path_and_query, fragment) = match after_host.split_once('#') {
            Some((a, b)) => (a, Some(b.to_string())),
            None => (after_host, None),
        };
        let (path, query) = match path_and_query.split_once('?') {
            Some((a, b)) => (a, Some(b.to_string())),
            None => (path_and_query, None),
        };

        if !path.starts_with('/') {
            return Err(UriError::Malformed(input.to_string()));
        }

        Ok(Uri {
            scheme: scheme.to_string(),
            host: host.to_string(),
            path: path.to_string(),
            query,
            fragment,
        })
    }

    /// Joins the five parts back into a URI string. Refuses a path that does
    /// not start with `/`.
    pub fn join(
        scheme: &str,
        host: &str,
        path: &str,
        query: Option<&str>,
        fragment: Option<&str>,
    ) -> Result<String, UriError> {
        if !path.starts_with('/') {
            return Err(UriError::InvalidPath(path.to_string()));
        }
        let mut out = format!("{scheme}://{host}{path}");
        if let Some(q) = query {
            out.push('?');
            out.push_str(q);
        }
        if let Some(f) = fragment {
            out.push('#');
            out.push_str(f);
        }
        Ok(out)
    }

    /// Rebuilds the canonical URI string for this value. Equivalent to
    /// `Uri::join` applied to this instance's own parts; always succeeds
    /// because `path` was validated at parse time.
    pub fn to_uri_string(&self) -> String {
        Uri::join(
            &self.scheme,
            &self.host,
            &self.path,
            self.query.as_deref(),
            self.fragment.as_deref(),
        )
        .expect("path invariant established at parse time")
    }

    /// The scheme, used to resolve a handler.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '+' || c == '_' || c == '-'
}
