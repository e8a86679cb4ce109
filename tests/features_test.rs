//! Feature extraction, URL decomposition, schema loading and vector assembly.

use phishguard::config::FeaturesConfig;
use phishguard::features::url::{query_param_count, HostParts, ParsedUrl, UrlError};
use phishguard::features::{
    assemble, assemble_bag, extract, DegradeReason, Extraction, Feature, FeatureBag,
    FeatureExtractor, FeatureMapping, FeatureSchema, SchemaSource, FEATURE_COUNT,
};
use serde_json::json;
use std::io::Write;

fn features(url: &str) -> FeatureMapping {
    match extract(url) {
        Extraction::Parsed(m) => m,
        Extraction::Degraded { reason, .. } => panic!("{} degraded: {}", url, reason),
    }
}

#[test]
fn ip_login_url() {
    let m = features("http://192.168.1.1/login");
    assert_eq!(m.get(Feature::IpAddress), 1.0);
    assert_eq!(m.get(Feature::NoHttps), 1.0);
    assert!(m.get(Feature::PathLevel) >= 1.0);
    assert!(m.get(Feature::NumSensitiveWords) >= 1.0);
    assert_eq!(m.get(Feature::NumDots), 3.0);
    assert_eq!(m.get(Feature::UrlLength), 24.0);
    assert_eq!(m.get(Feature::NumNumericChars), 8.0);
    assert_eq!(m.get(Feature::SubdomainLevel), 0.0);
    assert_eq!(m.get(Feature::RandomString), 0.0);
}

#[test]
fn brand_impersonation_url() {
    let m = features("https://secure-paypal-verify.com/update");
    assert_eq!(m.get(Feature::EmbeddedBrandName), 1.0);
    // secure, paypal, verify, update
    assert_eq!(m.get(Feature::NumSensitiveWords), 4.0);
    assert_eq!(m.get(Feature::NoHttps), 0.0);
    assert_eq!(m.get(Feature::NumDashInHostname), 2.0);
    assert_eq!(m.get(Feature::HostnameLength), 24.0);
    assert_eq!(m.get(Feature::PathLevel), 1.0);
}

#[test]
fn brand_on_own_domain_is_not_embedded() {
    let m = features("https://www.paypal.com/signin");
    assert_eq!(m.get(Feature::EmbeddedBrandName), 0.0);
    assert_eq!(m.get(Feature::SubdomainLevel), 1.0);
    assert_eq!(m.get(Feature::NumSensitiveWords), 2.0);
}

#[test]
fn sensitive_word_counts_each_term_once() {
    let m = features("https://example.com/login/login/login");
    assert_eq!(m.get(Feature::NumSensitiveWords), 1.0);
    assert_eq!(m.get(Feature::PathLevel), 3.0);
}

#[test]
fn domain_reappearing_in_subdomain_and_path() {
    let m = features("http://example.com.example.net/a");
    assert_eq!(m.get(Feature::DomainInSubdomains), 1.0);
    assert_eq!(m.get(Feature::SubdomainLevel), 2.0);

    let m = features("https://foo.com/foo/bar");
    assert_eq!(m.get(Feature::DomainInPaths), 1.0);
    assert_eq!(m.get(Feature::DomainInSubdomains), 0.0);
}

#[test]
fn random_consonant_run() {
    assert_eq!(features("https://xkcdqwrtzpl.com").get(Feature::RandomString), 1.0);
    assert_eq!(features("https://example.com").get(Feature::RandomString), 0.0);
    // Case-insensitive
    assert_eq!(features("https://XKCDQWRTZ.com").get(Feature::RandomString), 1.0);
}

#[test]
fn query_components_and_lengths() {
    let m = features("http://a.com/p?x=1&y=2&x=3&z=&w");
    assert_eq!(m.get(Feature::NumQueryComponents), 2.0);
    assert_eq!(m.get(Feature::NumAmpersand), 4.0);
    assert_eq!(m.get(Feature::QueryLength), 16.0);
    assert_eq!(m.get(Feature::PathLength), 2.0);
}

#[test]
fn structural_flags() {
    assert_eq!(features("http://a.com//evil").get(Feature::DoubleSlashInPath), 1.0);
    assert_eq!(features("http://a.com/x/y").get(Feature::DoubleSlashInPath), 0.0);
    assert_eq!(features("http://https-login.com").get(Feature::HttpsInHostname), 1.0);

    let m = features("http://user@evil.com/~home#top");
    assert_eq!(m.get(Feature::AtSymbol), 1.0);
    assert_eq!(m.get(Feature::TildeSymbol), 1.0);
    assert_eq!(m.get(Feature::NumHash), 1.0);
    assert_eq!(m.get(Feature::HostnameLength), 8.0);
}

#[test]
fn realtime_variants_mirror_static_values() {
    let m = features("https://a.b.c.example.co.uk/path");
    assert_eq!(m.get(Feature::SubdomainLevel), 3.0);
    assert_eq!(m.get(Feature::SubdomainLevelRT), 3.0);
    assert_eq!(m.get(Feature::UrlLengthRT), m.get(Feature::UrlLength));
    assert_eq!(m.get(Feature::PctExtHyperlinks), 0.0);
    assert_eq!(m.get(Feature::MissingTitle), 0.0);
}

#[test]
fn unbalanced_ipv6_netloc_is_degraded() {
    let outcome = extract("http://[::1/admin");
    assert!(outcome.is_degraded());
    assert!(outcome.mapping().is_zeroed());
    match outcome {
        Extraction::Degraded { reason, .. } => assert!(matches!(
            reason,
            DegradeReason::Unparseable(UrlError::UnbalancedBrackets(_))
        )),
        Extraction::Parsed(_) => unreachable!(),
    }

    assert!(extract("http://[not-an-address]/x").is_degraded());
    assert!(!extract("http://[::1]:8080/x").is_degraded());
}

#[test]
fn missing_hostname_defaults_host_features() {
    let m = features("no-scheme-or-host");
    assert_eq!(m.get(Feature::HostnameLength), 0.0);
    assert_eq!(m.get(Feature::NumDashInHostname), 0.0);
    assert_eq!(m.get(Feature::IpAddress), 0.0);
    assert_eq!(m.get(Feature::NoHttps), 1.0);
    assert_eq!(m.get(Feature::NumDash), 3.0);
}

#[test]
fn extraction_is_total_on_hostile_input() {
    let long = format!("https://{}.com/{}", "a".repeat(5_000), "b/".repeat(5_000));
    let inputs = [
        "",
        " ",
        "\u{0}\u{1}",
        "://",
        "http://",
        "http://[",
        "http://]",
        "日本語.jp/パス?クエリ=値",
        "%%%%%",
        "http://a.com?&&&===",
        "javascript:alert(1)",
        "http://user:pass@[::1]:80/",
        "\t\r\n",
        long.as_str(),
    ];
    for input in inputs {
        let outcome = extract(input);
        assert!(outcome.mapping().iter().all(|(_, v)| v.is_finite() && v >= 0.0), "{:?}", input);
    }
}

#[test]
fn parsed_url_components() {
    let p = ParsedUrl::parse("HTTPS://User:Pw@Example.COM:8443/a/b;v=1?q=1#frag").unwrap();
    assert_eq!(p.scheme, "https");
    assert_eq!(p.netloc, "User:Pw@Example.COM:8443");
    assert_eq!(p.hostname.as_deref(), Some("example.com"));
    assert_eq!(p.path, "/a/b");
    assert_eq!(p.params, "v=1");
    assert_eq!(p.query, "q=1");
    assert_eq!(p.fragment, "frag");

    let p = ParsedUrl::parse("example.com/path").unwrap();
    assert_eq!(p.scheme, "");
    assert_eq!(p.hostname, None);
    assert_eq!(p.path, "example.com/path");
}

#[test]
fn host_decomposition() {
    let none: Vec<String> = Vec::new();
    let h = HostParts::decompose("secure.login.paypal.co.uk", &none);
    assert_eq!(h.subdomain, "secure.login");
    assert_eq!(h.domain, "paypal");
    assert_eq!(h.suffix, "co.uk");

    let h = HostParts::decompose("192.168.1.1", &none);
    assert_eq!(h.domain, "192.168.1.1");
    assert!(h.subdomain.is_empty());

    let h = HostParts::decompose("localhost", &none);
    assert_eq!(h.domain, "localhost");
    assert!(h.suffix.is_empty());

    let h = HostParts::decompose("co.uk", &none);
    assert!(h.domain.is_empty());

    let extra = vec!["internal.corp".to_string()];
    let h = HostParts::decompose("app.acme.internal.corp", &extra);
    assert_eq!(h.domain, "acme");
    assert_eq!(h.subdomain, "app");
}

#[test]
fn extra_suffixes_change_subdomain_level() {
    let extractor = FeatureExtractor::new(FeaturesConfig {
        extra_public_suffixes: vec!["example.com".to_string()],
    });
    let m = extractor.extract("https://a.b.example.com").into_mapping();
    assert_eq!(m.get(Feature::SubdomainLevel), 1.0);

    let m = extract("https://a.b.example.com").into_mapping();
    assert_eq!(m.get(Feature::SubdomainLevel), 2.0);
}

#[test]
fn query_param_counting() {
    assert_eq!(query_param_count(""), 0);
    assert_eq!(query_param_count("a=1&a=2"), 1);
    assert_eq!(query_param_count("a+b=1&a%20b=2"), 1);
    assert_eq!(query_param_count("a=&b"), 0);
}

#[test]
fn builtin_schema_layout() {
    let schema = FeatureSchema::builtin();
    assert_eq!(schema.len(), FEATURE_COUNT);
    assert_eq!(schema.names()[0], "NumDots");
    assert_eq!(schema.names()[FEATURE_COUNT - 1], "PctExtNullSelfRedirectHyperlinksRT");
    for (i, f) in Feature::ALL.iter().enumerate() {
        assert_eq!(Feature::from_name(&schema.names()[i]), Some(*f));
    }
}

#[test]
fn schema_fingerprint_depends_on_order() {
    let a = FeatureSchema::new(vec!["A".into(), "B".into()]).unwrap();
    let b = FeatureSchema::new(vec!["B".into(), "A".into()]).unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint(), a.clone().fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[test]
fn schema_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feature_columns.json");
    std::fs::write(&path, r#"["UrlLength", "NoHttps", "NotAFeature"]"#).unwrap();

    let loaded = FeatureSchema::load(Some(&path));
    assert_eq!(loaded.source, SchemaSource::File(path.clone()));
    assert_eq!(loaded.schema.len(), 3);

    let v = assemble(&features("http://a.com"), &loaded.schema);
    assert_eq!(v.values, vec![12.0, 1.0, 0.0]);
}

#[test]
fn schema_load_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    let loaded = FeatureSchema::load(Some(&missing));
    assert_eq!(loaded.source, SchemaSource::Builtin);
    assert_eq!(loaded.schema.len(), FEATURE_COUNT);

    let malformed = dir.path().join("malformed.json");
    let mut f = std::fs::File::create(&malformed).unwrap();
    f.write_all(b"{not json").unwrap();
    assert_eq!(FeatureSchema::load(Some(&malformed)).source, SchemaSource::Builtin);

    let duplicate = dir.path().join("duplicate.json");
    std::fs::write(&duplicate, r#"["NumDots", "NumDots"]"#).unwrap();
    assert_eq!(FeatureSchema::load(Some(&duplicate)).source, SchemaSource::Builtin);

    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, "[]").unwrap();
    assert_eq!(FeatureSchema::load(Some(&empty)).source, SchemaSource::Builtin);

    assert_eq!(FeatureSchema::load(None).source, SchemaSource::Builtin);
}

#[test]
fn assemble_length_matches_schema() {
    let mapping = features("https://example.com/a?b=c");
    let schemas = [
        FeatureSchema::builtin().clone(),
        FeatureSchema::new(vec!["Only".into()]).unwrap(),
        FeatureSchema::new((0..200).map(|i| format!("f{}", i)).collect()).unwrap(),
    ];
    for schema in &schemas {
        assert_eq!(assemble(&mapping, schema).len(), schema.len());
        assert_eq!(assemble(&FeatureMapping::zeroed(), schema).len(), schema.len());
    }
}

#[test]
fn assemble_bag_coercion() {
    let schema = FeatureSchema::new(vec![
        "NumDots".into(),
        "NoHttps".into(),
        "UrlLength".into(),
        "PathLevel".into(),
        "NumDash".into(),
        "Missing".into(),
    ])
    .unwrap();
    let mut bag = FeatureBag::new();
    bag.insert("NumDots".into(), json!(3));
    bag.insert("NoHttps".into(), json!(true));
    bag.insert("UrlLength".into(), json!("85"));
    bag.insert("PathLevel".into(), json!("abc"));
    bag.insert("NumDash".into(), json!(null));
    bag.insert("Extra".into(), json!(5));

    let v = assemble_bag(&bag, &schema);
    assert_eq!(v.values, vec![3.0, 1.0, 85.0, 0.0, 0.0, 0.0]);
}

#[test]
fn mapping_serializes_every_feature_by_name() {
    let value = serde_json::to_value(features("https://example.com")).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), FEATURE_COUNT);
    assert_eq!(obj["NoHttps"], json!(0.0));
    assert_eq!(obj["HostnameLength"], json!(11.0));
}

#[test]
fn host_decomposition_matches_public_suffix_list() {
    let none: Vec<String> = Vec::new();
    let cases = [
        ("www.google.com", "www", "google", "com"),
        ("forums.news.cnn.com", "forums.news", "cnn", "com"),
        ("www.bbc.co.uk", "www", "bbc", "co.uk"),
        ("login.paypal.academy", "login", "paypal", "academy"),
        ("secure.bank.com.qa", "secure", "bank", "com.qa"),
        ("www.example.gov.il", "www", "example", "gov.il"),
        ("shop.example.com.au", "shop", "example", "com.au"),
        ("mail.yahoo.co.jp", "mail", "yahoo", "co.jp"),
        ("a.b.example.guru", "a.b", "example", "guru"),
        ("example.ninja", "", "example", "ninja"),
        ("www.amazon.de", "www", "amazon", "de"),
        // Private-section rules are not suffixes
        ("user.blogspot.com", "user", "blogspot", "com"),
        ("foo.github.io", "foo", "github", "io"),
        ("localhost", "", "localhost", ""),
        ("www.unknownlabel", "www", "unknownlabel", ""),
    ];
    for (host, subdomain, domain, suffix) in cases {
        let h = HostParts::decompose(host, &none);
        assert_eq!(
            (h.subdomain.as_str(), h.domain.as_str(), h.suffix.as_str()),
            (subdomain, domain, suffix),
            "{}",
            host
        );
    }
}

#[test]
fn new_gtld_and_second_level_cctld_hosts() {
    let m = features("https://login.paypal.academy/");
    assert_eq!(m.get(Feature::EmbeddedBrandName), 0.0);
    assert_eq!(m.get(Feature::SubdomainLevel), 1.0);
    assert_eq!(m.get(Feature::SubdomainLevelRT), 1.0);

    let m = features("https://secure.bank.com.qa/bank");
    assert_eq!(m.get(Feature::SubdomainLevel), 1.0);
    assert_eq!(m.get(Feature::DomainInPaths), 1.0);
    assert_eq!(m.get(Feature::DomainInSubdomains), 0.0);
}

#[test]
fn numeric_chars_follow_digit_semantics() {
    // Fractions and Roman numerals are numeric but not digits
    assert_eq!(features("https://a.com/½Ⅷ").get(Feature::NumNumericChars), 0.0);
    // Superscript two, Arabic-Indic three, circled one
    assert_eq!(features("https://a.com/x²٣①").get(Feature::NumNumericChars), 3.0);
    assert_eq!(features("https://a.com/2024").get(Feature::NumNumericChars), 4.0);
}
