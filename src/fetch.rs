//! Helpers for documents fetched from the web.
//!
//! The network call itself is left to the caller; this module decides
//! which URLs may be fetched, how large a response may be, and what file
//! name the fetched bytes are parsed under.

use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use crate::error::{Error, Result};

/// File name used when the URL path has no last segment.
pub const DEFAULT_WEB_FILENAME: &str = "webpage.html";

/// User agent sent with fetch requests.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Limits applied to a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Largest accepted response body
    pub max_bytes: usize,
    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            timeout_secs: 10,
        }
    }
}

impl FetchPolicy {
    /// Reject a body larger than `max_bytes`.
    pub fn check_size(&self, len: usize) -> Result<()> {
        if len > self.max_bytes {
            return Err(Error::InvalidUrl(format!(
                "content too large ({} bytes, max {})",
                len, self.max_bytes
            )));
        }
        Ok(())
    }
}

/// Trim the input and add `https://` when it has no scheme.
pub fn normalize_url(input: &str) -> String {
    let url = input.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Parse `url` and check that it is an http(s) URL to a public host.
///
/// Loopback, private, link-local and unspecified addresses are refused, as
/// is `localhost`. The returned [`Url`] is the one that should be requested,
/// so the check and the request never disagree about the host.
pub fn check_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            url,
            parsed.scheme()
        )));
    }

    let private = match parsed.host() {
        None => return Err(Error::InvalidUrl(format!("{}: no host", url))),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_private_v4(ip),
        Some(Host::Ipv6(ip)) => match ip.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(ip),
        },
    };
    if private {
        return Err(Error::InvalidUrl(format!("{}: local or private host", url)));
    }

    Ok(parsed)
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local, fe80::/10 link local
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
}

/// Last path segment of `url`, or [`DEFAULT_WEB_FILENAME`].
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_WEB_FILENAME.to_string())
}
