//! Result file writer.
//!
//! Enriched records are written as one pretty-printed JSON array (4-space
//! indent) to `{dir}/result_{YYYY-mm-dd_HH-MM-SS}.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info, instrument};

use portfolio_shared::{EnrichedRecord, PortfolioError, Result};

/// File name of a result written at `at`.
pub fn result_file_name(at: DateTime<Local>) -> String {
    format!("result_{}.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Serialize `value` as JSON with a 4-space indent. Non-ASCII text is kept as is.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Serialize `value` for writing to `path`; a failure is an I/O error on `path`.
fn encode_for<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<Vec<u8>> {
    to_pretty_json(value).map_err(|e| PortfolioError::io(path, e.into()))
}

/// Write `records` into a new timestamped file under `dir`, creating `dir`
/// if needed. Returns the path written.
#[instrument(skip_all, fields(dir = %dir.display(), records = records.len()))]
pub fn write_results(dir: &Path, records: &[EnrichedRecord]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PortfolioError::io(dir, e))?;

    let file_name = result_file_name(Local::now());
    let target = dir.join(&file_name);
    let temp = dir.join(format!(".{file_name}.tmp"));

    let json = encode_for(&temp, records)?;
    std::fs::write(&temp, &json).map_err(|e| PortfolioError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| PortfolioError::io(&target, e))?;

    debug!(path = %target.display(), bytes = json.len(), "wrote result file");
    info!(path = %target.display(), records = records.len(), "results written");

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use portfolio_shared::{CompanyRecord, CompanySummary};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ph-output-test-{}", uuid::Uuid::now_v7()))
    }

    fn record(title: &str) -> EnrichedRecord {
        EnrichedRecord {
            company: CompanyRecord::bare(CompanySummary {
                title: title.to_string(),
                sector: None,
                country: Some("Sverige".into()),
                fund: vec!["EQT X".into()],
                entry_date: None,
                exit_date: None,
                detail_path: None,
            }),
            organization: None,
            funding_rounds: Some(vec![]),
        }
    }

    #[test]
    fn file_name_uses_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(result_file_name(at), "result_2024-03-09_07-05-01.json");
    }

    #[test]
    fn pretty_json_uses_four_spaces_and_keeps_unicode() {
        let json = String::from_utf8(to_pretty_json(&[record("Öresund")]).unwrap()).unwrap();
        assert!(json.starts_with("[\n    {\n        \"title\": \"Öresund\""));
        assert!(json.contains("\"country\": \"Sverige\""));
    }

    #[test]
    fn unserializable_value_is_an_io_error_on_the_file() {
        let bad = std::collections::BTreeMap::from([(vec![1u8], 1u8)]);
        let path = Path::new("/tmp/result.json.tmp");

        let err = encode_for(path, &bad).unwrap_err();
        match err {
            PortfolioError::Io { path: p, source } => {
                assert_eq!(p, path);
                assert!(source.to_string().contains("key must be a string"));
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn write_results_creates_dir_and_file() {
        let dir = temp_dir().join("nested");
        let path = write_results(&dir, &[record("A"), record("B")]).unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("result_") && name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);
        assert_eq!(written[1]["title"], "B");

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }
}
