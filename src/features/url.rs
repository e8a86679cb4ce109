//! Lenient URL decomposition for lexical analysis.
//!
//! This is a generic-syntax splitter, not a validating parser: almost any
//! string decomposes into scheme / netloc / path / params / query / fragment.
//! The only hard failures are structurally broken IPv6 netlocs, which the
//! extractor treats as degraded input.
//!
//! Hostnames are further split into subdomain, registrable domain and public
//! suffix against the embedded ICANN public suffix list (see
//! [`HostParts::decompose`]).

use regex::Regex;
use std::net::Ipv6Addr;
use std::sync::OnceLock;
use thiserror::Error;

static LOOKS_LIKE_IPV4: OnceLock<Regex> = OnceLock::new();
static IPV_FUTURE: OnceLock<Regex> = OnceLock::new();

fn looks_like_ipv4(host: &str) -> bool {
    LOOKS_LIKE_IPV4
        .get_or_init(|| {
            Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
                .expect("ipv4 pattern")
        })
        .is_match(host)
}

/// Schemes whose last path segment may carry `;params`.
const USES_PARAMS: &[&str] = &[
    "", "ftp", "hdl", "prospero", "http", "imap", "https", "shttp", "rtsp", "rtsps", "rtspu",
    "sip", "sips", "mms", "sftp", "tel",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("unbalanced brackets in netloc {0:?}")]
    UnbalancedBrackets(String),
    #[error("bracketed host {0:?} is not an IPv6 literal")]
    InvalidBracketedHost(String),
}

/// Components of a URL string. Every field except `hostname` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Lowercased
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
    /// Netloc minus userinfo and port, brackets removed, lowercased.
    pub hostname: Option<String>,
}

impl ParsedUrl {
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let cleaned: String = url
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();
        let mut rest = cleaned.trim_start_matches(|c: char| c <= ' ');

        let mut scheme = String::new();
        if let Some(i) = rest.find(':') {
            let candidate = &rest[..i];
            let valid = candidate
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if valid {
                scheme = candidate.to_ascii_lowercase();
                rest = &rest[i + 1..];
            }
        }

        let mut netloc = "";
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            netloc = &after[..end];
            rest = &after[end..];
            check_netloc(netloc)?;
        }

        let mut fragment = "";
        if let Some(i) = rest.find('#') {
            fragment = &rest[i + 1..];
            rest = &rest[..i];
        }
        let mut query = "";
        if let Some(i) = rest.find('?') {
            query = &rest[i + 1..];
            rest = &rest[..i];
        }
        let (path, params) = if USES_PARAMS.contains(&scheme.as_str()) {
            split_params(rest)
        } else {
            (rest, "")
        };

        Ok(Self {
            hostname: hostname_of(netloc),
            scheme,
            netloc: netloc.to_string(),
            path: path.to_string(),
            params: params.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        })
    }
}

fn check_netloc(netloc: &str) -> Result<(), UrlError> {
    let open = netloc.contains('[');
    let close = netloc.contains(']');
    if open != close {
        return Err(UrlError::UnbalancedBrackets(netloc.to_string()));
    }
    if open {
        let inner = netloc
            .split_once('[')
            .map(|(_, b)| b.split(']').next().unwrap_or(""))
            .unwrap_or("");
        if !is_bracketed_host(inner) {
            return Err(UrlError::InvalidBracketedHost(inner.to_string()));
        }
    }
    Ok(())
}

fn is_bracketed_host(host: &str) -> bool {
    if host.starts_with('v') {
        return IPV_FUTURE
            .get_or_init(|| Regex::new(r"^v[a-fA-F0-9]+\..+$").expect("ipvfuture pattern"))
            .is_match(host);
    }
    let addr = host.split('%').next().unwrap_or(host);
    addr.parse::<Ipv6Addr>().is_ok()
}

fn split_params(url: &str) -> (&str, &str) {
    let start = match url.rfind('/') {
        Some(slash) => url[slash..].find(';').map(|i| slash + i),
        None => url.find(';'),
    };
    match start {
        Some(i) => (&url[..i], &url[i + 1..]),
        None => (url, ""),
    }
}

fn hostname_of(netloc: &str) -> Option<String> {
    let hostinfo = netloc.rsplit_once('@').map(|(_, h)| h).unwrap_or(netloc);
    let host = match hostinfo.split_once('[') {
        Some((_, bracketed)) => bracketed.split(']').next().unwrap_or(""),
        None => hostinfo.split(':').next().unwrap_or(""),
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Number of distinct query keys carrying a non-blank value.
///
/// Pairs are `&`-separated and split on the first `=`; keys are decoded
/// (`+` as space, then percent-escapes) before de-duplication. Pairs without
/// `=` or with an empty value are ignored.
pub fn query_param_count(query: &str) -> usize {
    let mut keys: Vec<String> = Vec::new();
    for pair in query.split('&') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let key = percent_decode(&name.replace('+', " "));
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.len()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Labels in the ICANN public suffix of `host`, 0 when none is known.
///
/// Private-section rules (`blogspot.com`, `github.io`, ...) are not
/// suffixes here: a private match is retried on its parent until an ICANN
/// rule answers.
fn icann_suffix_labels(host: &str) -> usize {
    let mut tail = host;
    loop {
        let Some(suffix) = psl::suffix(tail.as_bytes()) else {
            return 0;
        };
        if !suffix.is_known() {
            return 0;
        }
        let Ok(name) = std::str::from_utf8(suffix.as_bytes()) else {
            return 0;
        };
        if !matches!(suffix.typ(), Some(psl::Type::Private)) {
            return name.split('.').count();
        }
        match name.split_once('.') {
            Some((_, parent)) => tail = parent,
            None => return 0,
        }
    }
}

/// Labels in the longest configured extra suffix ending `host`.
fn extra_suffix_labels(host: &str, extra: &[String]) -> usize {
    extra
        .iter()
        .map(|s| s.trim_matches('.').to_ascii_lowercase())
        .filter(|s| {
            !s.is_empty()
                && (host == s.as_str()
                    || host
                        .strip_suffix(s.as_str())
                        .is_some_and(|rest| rest.ends_with('.')))
        })
        .map(|s| s.split('.').count())
        .max()
        .unwrap_or(0)
}

/// A hostname split around its registrable domain.
///
/// `secure.login.paypal.co.uk` → subdomain `secure.login`, domain `paypal`,
/// suffix `co.uk`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostParts {
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
}

impl HostParts {
    /// Split `host` (already lowercased) against the ICANN public suffix
    /// list, overlaid with `extra_suffixes`; the longer match wins.
    /// IP literals become the domain. Without a known suffix the last label
    /// is the domain; a host that is itself a suffix has an empty domain.
    pub fn decompose(host: &str, extra_suffixes: &[String]) -> Self {
        let host = host.strip_suffix('.').unwrap_or(host);
        if host.is_empty() {
            return Self::default();
        }
        if looks_like_ipv4(host) || host.parse::<Ipv6Addr>().is_ok() {
            return Self {
                domain: host.to_string(),
                ..Self::default()
            };
        }

        let labels: Vec<&str> = host.split('.').collect();
        let suffix_len = icann_suffix_labels(host)
            .max(extra_suffix_labels(host, extra_suffixes))
            .min(labels.len());
        let suffix_index = labels.len() - suffix_len;

        Self {
            subdomain: if suffix_index >= 2 {
                labels[..suffix_index - 1].join(".")
            } else {
                String::new()
            },
            domain: if suffix_index > 0 {
                labels[suffix_index - 1].to_string()
            } else {
                String::new()
            },
            suffix: labels[suffix_index..].join("."),
        }
    }
}
