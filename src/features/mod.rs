//! Lexical URL feature extraction: URL string → named features → schema-ordered vector.

mod lexical;
mod pipeline;
pub mod schema;
pub mod url;

pub use lexical::{extract, DegradeReason, Extraction, FeatureExtractor};
pub use pipeline::{assemble, assemble_bag, FeatureBag};
pub use schema::{FeatureSchema, SchemaLoad, SchemaSource};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Every feature the extractor knows how to produce.
///
/// This is the closed key set of a [`FeatureMapping`]. Schema names that do
/// not resolve to a variant are filled with 0 during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    NumDots,
    SubdomainLevel,
    PathLevel,
    UrlLength,
    NumDash,
    NumDashInHostname,
    AtSymbol,
    TildeSymbol,
    NumUnderscore,
    NumPercent,
    NumQueryComponents,
    NumAmpersand,
    NumHash,
    NumNumericChars,
    NoHttps,
    RandomString,
    IpAddress,
    DomainInSubdomains,
    DomainInPaths,
    HttpsInHostname,
    HostnameLength,
    PathLength,
    QueryLength,
    DoubleSlashInPath,
    NumSensitiveWords,
    EmbeddedBrandName,
    PctExtHyperlinks,
    PctExtResourceUrls,
    ExtFavicon,
    InsecureForms,
    RelativeFormAction,
    ExtFormAction,
    AbnormalFormAction,
    PctNullSelfRedirectHyperlinks,
    FrequentDomainNameMismatch,
    FakeLinkInStatusBar,
    RightClickDisabled,
    PopUpWindow,
    SubmitInfoToEmail,
    IframeOrFrame,
    MissingTitle,
    ImagesOnlyInForm,
    SubdomainLevelRT,
    UrlLengthRT,
    PctExtResourceUrlsRT,
    AbnormalExtFormActionR,
    ExtMetaScriptLinkRT,
    PctExtNullSelfRedirectHyperlinksRT,
}

/// Number of [`Feature`] variants
pub const FEATURE_COUNT: usize = 48;

impl Feature {
    /// All features, in training order of the built-in schema.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::NumDots,
        Feature::SubdomainLevel,
        Feature::PathLevel,
        Feature::UrlLength,
        Feature::NumDash,
        Feature::NumDashInHostname,
        Feature::AtSymbol,
        Feature::TildeSymbol,
        Feature::NumUnderscore,
        Feature::NumPercent,
        Feature::NumQueryComponents,
        Feature::NumAmpersand,
        Feature::NumHash,
        Feature::NumNumericChars,
        Feature::NoHttps,
        Feature::RandomString,
        Feature::IpAddress,
        Feature::DomainInSubdomains,
        Feature::DomainInPaths,
        Feature::HttpsInHostname,
        Feature::HostnameLength,
        Feature::PathLength,
        Feature::QueryLength,
        Feature::DoubleSlashInPath,
        Feature::NumSensitiveWords,
        Feature::EmbeddedBrandName,
        Feature::PctExtHyperlinks,
        Feature::PctExtResourceUrls,
        Feature::ExtFavicon,
        Feature::InsecureForms,
        Feature::RelativeFormAction,
        Feature::ExtFormAction,
        Feature::AbnormalFormAction,
        Feature::PctNullSelfRedirectHyperlinks,
        Feature::FrequentDomainNameMismatch,
        Feature::FakeLinkInStatusBar,
        Feature::RightClickDisabled,
        Feature::PopUpWindow,
        Feature::SubmitInfoToEmail,
        Feature::IframeOrFrame,
        Feature::MissingTitle,
        Feature::ImagesOnlyInForm,
        Feature::SubdomainLevelRT,
        Feature::UrlLengthRT,
        Feature::PctExtResourceUrlsRT,
        Feature::AbnormalExtFormActionR,
        Feature::ExtMetaScriptLinkRT,
        Feature::PctExtNullSelfRedirectHyperlinksRT,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::NumDots => "NumDots",
            Feature::SubdomainLevel => "SubdomainLevel",
            Feature::PathLevel => "PathLevel",
            Feature::UrlLength => "UrlLength",
            Feature::NumDash => "NumDash",
            Feature::NumDashInHostname => "NumDashInHostname",
            Feature::AtSymbol => "AtSymbol",
            Feature::TildeSymbol => "TildeSymbol",
            Feature::NumUnderscore => "NumUnderscore",
            Feature::NumPercent => "NumPercent",
            Feature::NumQueryComponents => "NumQueryComponents",
            Feature::NumAmpersand => "NumAmpersand",
            Feature::NumHash => "NumHash",
            Feature::NumNumericChars => "NumNumericChars",
            Feature::NoHttps => "NoHttps",
            Feature::RandomString => "RandomString",
            Feature::IpAddress => "IpAddress",
            Feature::DomainInSubdomains => "DomainInSubdomains",
            Feature::DomainInPaths => "DomainInPaths",
            Feature::HttpsInHostname => "HttpsInHostname",
            Feature::HostnameLength => "HostnameLength",
            Feature::PathLength => "PathLength",
            Feature::QueryLength => "QueryLength",
            Feature::DoubleSlashInPath => "DoubleSlashInPath",
            Feature::NumSensitiveWords => "NumSensitiveWords",
            Feature::EmbeddedBrandName => "EmbeddedBrandName",
            Feature::PctExtHyperlinks => "PctExtHyperlinks",
            Feature::PctExtResourceUrls => "PctExtResourceUrls",
            Feature::ExtFavicon => "ExtFavicon",
            Feature::InsecureForms => "InsecureForms",
            Feature::RelativeFormAction => "RelativeFormAction",
            Feature::ExtFormAction => "ExtFormAction",
            Feature::AbnormalFormAction => "AbnormalFormAction",
            Feature::PctNullSelfRedirectHyperlinks => "PctNullSelfRedirectHyperlinks",
            Feature::FrequentDomainNameMismatch => "FrequentDomainNameMismatch",
            Feature::FakeLinkInStatusBar => "FakeLinkInStatusBar",
            Feature::RightClickDisabled => "RightClickDisabled",
            Feature::PopUpWindow => "PopUpWindow",
            Feature::SubmitInfoToEmail => "SubmitInfoToEmail",
            Feature::IframeOrFrame => "IframeOrFrame",
            Feature::MissingTitle => "MissingTitle",
            Feature::ImagesOnlyInForm => "ImagesOnlyInForm",
            Feature::SubdomainLevelRT => "SubdomainLevelRT",
            Feature::UrlLengthRT => "UrlLengthRT",
            Feature::PctExtResourceUrlsRT => "PctExtResourceUrlsRT",
            Feature::AbnormalExtFormActionR => "AbnormalExtFormActionR",
            Feature::ExtMetaScriptLinkRT => "ExtMetaScriptLinkRT",
            Feature::PctExtNullSelfRedirectHyperlinksRT => "PctExtNullSelfRedirectHyperlinksRT",
        }
    }

    /// Resolve a schema column name. Exact, case-sensitive match.
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Extracted feature values keyed by [`Feature`].
///
/// Always holds a value for every feature; a fresh mapping is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMapping {
    values: [f32; FEATURE_COUNT],
}

impl Default for FeatureMapping {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FeatureMapping {
    pub fn zeroed() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn get(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    /// Non-finite values are stored as 0.
    pub fn set(&mut self, feature: Feature, value: f32) {
        self.values[feature.index()] = if value.is_finite() { value } else { 0.0 };
    }

    pub fn set_flag(&mut self, feature: Feature, on: bool) {
        self.set(feature, if on { 1.0 } else { 0.0 });
    }

    pub fn set_count(&mut self, feature: Feature, n: usize) {
        self.set(feature, n as f32);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f32)> + '_ {
        Feature::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    pub fn is_zeroed(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

impl Serialize for FeatureMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

/// Schema-ordered model input. Length always equals the schema length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
