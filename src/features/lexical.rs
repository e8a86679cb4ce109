//! Lexical features of a single URL. No network access, no page content.

use super::url::{query_param_count, HostParts, ParsedUrl, UrlError};
use super::{Feature, FeatureMapping};
use crate::config::FeaturesConfig;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

static DOTTED_QUAD: OnceLock<Regex> = OnceLock::new();
static CONSONANT_RUN: OnceLock<Regex> = OnceLock::new();
static DIGIT_CHAR: OnceLock<Regex> = OnceLock::new();

/// Terms counted by `NumSensitiveWords`; each counts at most once per URL.
pub const SENSITIVE_WORDS: &[&str] = &[
    "login", "secure", "account", "bank", "verify", "update", "confirm", "signin", "ebay",
    "paypal", "amazon",
];

/// Brands whose mention outside their own domain sets `EmbeddedBrandName`.
pub const BRAND_NAMES: &[&str] = &[
    "paypal", "amazon", "google", "microsoft", "apple", "facebook", "netflix", "ebay", "alibaba",
    "instagram",
];

fn dotted_quad() -> &'static Regex {
    DOTTED_QUAD.get_or_init(|| {
        Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("dotted quad pattern")
    })
}

fn consonant_run() -> &'static Regex {
    CONSONANT_RUN
        .get_or_init(|| Regex::new(r"[bcdfghjklmnpqrstvwxyz]{8,}").expect("consonant pattern"))
}

/// Decimal digits (Nd) plus the Numeric_Type=Digit characters: super- and
/// subscripts, circled and parenthesized digits and the like. Vulgar
/// fractions and Roman numerals are not digits.
fn digit_char() -> &'static Regex {
    DIGIT_CHAR.get_or_init(|| {
        Regex::new(concat!(
            r"[\p{Nd}\x{00B2}\x{00B3}\x{00B9}\x{2070}\x{2074}-\x{2079}\x{2080}-\x{2089}",
            r"\x{2460}-\x{2468}\x{2474}-\x{247C}\x{2488}-\x{2490}\x{24EA}\x{24F5}-\x{24FD}",
            r"\x{24FF}\x{2776}-\x{277E}\x{2780}-\x{2788}\x{278A}-\x{2792}\x{1369}-\x{1371}",
            r"\x{19DA}\x{10A40}-\x{10A43}\x{10E60}-\x{10E68}\x{11052}-\x{1105A}",
            r"\x{1F100}-\x{1F10A}]",
        ))
        .expect("digit pattern")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    Unparseable(UrlError),
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::Unparseable(e) => write!(f, "unparseable url: {}", e),
        }
    }
}

/// Outcome of extraction. Degraded input still yields a full (all-zero)
/// mapping; it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(FeatureMapping),
    Degraded {
        mapping: FeatureMapping,
        reason: DegradeReason,
    },
}

impl Extraction {
    pub fn mapping(&self) -> &FeatureMapping {
        match self {
            Extraction::Parsed(m) => m,
            Extraction::Degraded { mapping, .. } => mapping,
        }
    }

    pub fn into_mapping(self) -> FeatureMapping {
        match self {
            Extraction::Parsed(m) => m,
            Extraction::Degraded { mapping, .. } => mapping,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }
}

/// Extract with the default suffix table.
pub fn extract(url: &str) -> Extraction {
    FeatureExtractor::default().extract(url)
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Compute every [`Feature`] for `url`. Total: never panics, never fails.
    pub fn extract(&self, url: &str) -> Extraction {
        match ParsedUrl::parse(url) {
            Ok(parsed) => Extraction::Parsed(self.lexical(url, &parsed)),
            Err(e) => {
                debug!(url, error = %e, "url degraded to zero features");
                Extraction::Degraded {
                    mapping: FeatureMapping::zeroed(),
                    reason: DegradeReason::Unparseable(e),
                }
            }
        }
    }

    fn lexical(&self, url: &str, parsed: &ParsedUrl) -> FeatureMapping {
        let hostname = parsed.hostname.as_deref().unwrap_or("");
        let host = HostParts::decompose(hostname, &self.config.extra_public_suffixes);
        let lower = url.to_lowercase();
        let path = parsed.path.as_str();

        let mut m = FeatureMapping::zeroed();

        m.set_count(Feature::NumDots, count_char(url, '.'));
        m.set_count(Feature::NumDash, count_char(url, '-'));
        m.set_count(Feature::NumDashInHostname, count_char(hostname, '-'));
        m.set_flag(Feature::AtSymbol, url.contains('@'));
        m.set_flag(Feature::TildeSymbol, url.contains('~'));
        m.set_count(Feature::NumUnderscore, count_char(url, '_'));
        m.set_count(Feature::NumPercent, count_char(url, '%'));
        m.set_count(Feature::NumQueryComponents, query_param_count(&parsed.query));
        m.set_count(Feature::NumAmpersand, count_char(url, '&'));
        m.set_count(Feature::NumHash, count_char(url, '#'));
        m.set_count(Feature::NumNumericChars, digit_char().find_iter(url).count());

        m.set_flag(Feature::NoHttps, parsed.scheme != "https");

        let subdomain_level = if host.subdomain.is_empty() {
            0
        } else {
            host.subdomain.split('.').count()
        };
        m.set_count(Feature::SubdomainLevel, subdomain_level);

        m.set_count(
            Feature::PathLevel,
            path.split('/').filter(|s| !s.is_empty()).count(),
        );
        m.set_flag(Feature::DoubleSlashInPath, path.contains("//"));

        let url_length = url.chars().count();
        m.set_count(Feature::UrlLength, url_length);
        m.set_count(Feature::HostnameLength, hostname.chars().count());
        m.set_count(Feature::PathLength, path.chars().count());
        m.set_count(Feature::QueryLength, parsed.query.chars().count());

        m.set_flag(Feature::IpAddress, dotted_quad().is_match(hostname));

        let domain = host.domain.as_str();
        m.set_flag(
            Feature::DomainInSubdomains,
            !domain.is_empty() && host.subdomain.contains(domain),
        );
        m.set_flag(
            Feature::DomainInPaths,
            !domain.is_empty() && path.contains(domain),
        );
        m.set_flag(Feature::HttpsInHostname, hostname.contains("https"));

        m.set_flag(Feature::RandomString, consonant_run().is_match(&lower));
        m.set_count(
            Feature::NumSensitiveWords,
            SENSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count(),
        );
        let domain_lower = domain.to_lowercase();
        m.set_flag(
            Feature::EmbeddedBrandName,
            BRAND_NAMES.iter().any(|b| lower.contains(b))
                && !BRAND_NAMES.contains(&domain_lower.as_str()),
        );

        // Page-content features stay 0; the real-time copies of these two
        // mirror their static values as the training data did.
        m.set_count(Feature::SubdomainLevelRT, subdomain_level);
        m.set_count(Feature::UrlLengthRT, url_length);

        m
    }
}

fn count_char(s: &str, needle: char) -> usize {
    s.chars().filter(|c| *c == needle).count()
}
