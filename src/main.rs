//! phishguard entrypoint: classify URLs from arguments, or one per line on stdin.
//! Each verdict is printed as one JSON line on stdout; logs go to stderr.
//!
//! Flags: `--explain` prints the schema-ordered features instead of a verdict
//! (no model needed), `--info` prints the loaded detector summary.

use phishguard::{
    config::DetectorConfig,
    detector::{explain, url_lines, Detector},
    features::{FeatureExtractor, FeatureSchema},
    logging::{FailureRecord, StructuredLogger},
};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

enum Mode {
    Classify,
    Explain,
    Info,
}

fn read_urls(args: Vec<String>) -> std::io::Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    url_lines(std::io::stdin().lock())
}

fn explain_only(
    config: &DetectorConfig,
    urls: &[String],
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let schema = FeatureSchema::load(config.feature_columns_path.as_deref()).schema;
    let extractor = FeatureExtractor::new(config.features.clone());
    for url in urls {
        StructuredLogger::emit_json(&explain(&extractor, &schema, url), out)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("PHISHGUARD_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = DetectorConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let mut mode = Mode::Classify;
    let mut args = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--explain" => mode = Mode::Explain,
            "--info" => mode = Mode::Info,
            _ => args.push(arg),
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Mode::Explain = mode {
        let urls = read_urls(args)?;
        return explain_only(&config, &urls, &mut out);
    }

    let detector = Arc::new(Detector::from_config(&config)?);

    if let Mode::Info = mode {
        StructuredLogger::emit_json(&detector.info(), &mut out)?;
        return Ok(());
    }

    let urls = read_urls(args)?;
    info!(count = urls.len(), "classifying urls");

    let mut failures = 0usize;
    for url in &urls {
        match detector.classify(url) {
            Ok(result) => StructuredLogger::emit_json(&result, &mut out)?,
            Err(e) => {
                failures += 1;
                warn!(url = %url, error = %e, "prediction unavailable");
                StructuredLogger::emit_json(
                    &FailureRecord {
                        url,
                        error: e.to_string(),
                    },
                    &mut out,
                )?;
            }
        }
    }
    out.flush()?;

    if failures > 0 {
        return Err(format!("{} of {} urls could not be classified", failures, urls.len()).into());
    }
    Ok(())
}
