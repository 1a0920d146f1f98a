//! Dataset objects: download or read, gunzip, decode JSON lines.

use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use flate2::read::MultiGzDecoder;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use portfolio_shared::{DatasetsConfig, PortfolioError, Result};

/// User-Agent string for dataset downloads.
const USER_AGENT: &str = concat!("portfolio-harvester/", env!("CARGO_PKG_VERSION"));

/// First two bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// ---------------------------------------------------------------------------
// DatasetStore
// ---------------------------------------------------------------------------

/// Where dataset objects are read from.
#[derive(Debug, Clone)]
pub enum DatasetStore {
    /// A public bucket reachable over HTTP: `{base_url}/{object}`.
    Remote { client: Client, base_url: String },
    /// A local directory holding the objects as files.
    Local { root: PathBuf },
}

impl DatasetStore {
    /// Pick the store described by `[datasets]`: local when `local_dir` is set.
    pub fn from_config(config: &DatasetsConfig, timeout_secs: u64) -> Result<Self> {
        match &config.local_dir {
            Some(dir) => Ok(Self::local(dir)),
            None => Self::remote(&config.base_url, timeout_secs),
        }
    }

    /// Anonymous HTTP store rooted at `base_url`.
    pub fn remote(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PortfolioError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::Remote {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Store backed by files under `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local { root: root.into() }
    }

    /// Raw bytes of `object`, as stored.
    #[instrument(skip(self))]
    pub async fn fetch_bytes(&self, object: &str) -> Result<Vec<u8>> {
        match self {
            Self::Remote { client, base_url } => {
                let url = format!("{base_url}/{object}");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| PortfolioError::dataset(format!("{url}: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(PortfolioError::dataset(format!("{url}: HTTP {status}")));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| PortfolioError::dataset(format!("{url}: body read failed: {e}")))?;
                Ok(bytes.to_vec())
            }
            Self::Local { root } => {
                let path = root.join(object);
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| PortfolioError::io(path, e))
            }
        }
    }

    /// Load `object` as newline-delimited JSON rows of `T`.
    ///
    /// Gzip input is detected and decompressed. Lines that do not decode
    /// into `T` are skipped and counted in a warning.
    #[instrument(skip(self))]
    pub async fn load_rows<T>(&self, object: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let start = Instant::now();
        let bytes = self.fetch_bytes(object).await?;
        let object_name = object.to_string();

        let (rows, skipped) = tokio::task::spawn_blocking(move || {
            let text = decompress(bytes)?;
            Ok::<_, PortfolioError>(parse_json_lines::<T>(&text))
        })
        .await
        .map_err(|e| PortfolioError::dataset(format!("{object_name}: decode task failed: {e}")))??;

        if skipped > 0 {
            warn!(object, skipped, "skipped undecodable dataset rows");
        }
        info!(
            object,
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "dataset loaded"
        );

        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Gunzip `bytes` if they carry the gzip magic number, else return them as is.
pub fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut out = Vec::new();
    MultiGzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| PortfolioError::dataset(format!("gzip decode failed: {e}")))?;
    Ok(out)
}

/// Decode newline-delimited JSON. Returns the rows and the number of
/// non-blank lines that could not be decoded.
pub fn parse_json_lines<T: DeserializeOwned>(text: &[u8]) -> (Vec<T>, usize) {
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for line in text.split(|b| *b == b'\n') {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<T>(line) {
            Ok(row) => rows.push(row),
            Err(_) => skipped += 1,
        }
    }

    (rows, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use portfolio_shared::{FundingRoundRow, OrgRow};
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ORG_LINES: &str = concat!(
        r#"{"uuid":"u1","name":"WorkWave","homepage_url":"https://www.workwave.com","country_code":"USA"}"#,
        "\n",
        "\n",
        r#"{"uuid":"u2","name":"ManyPets","homepage_url":null}"#,
        "\n",
        "this is not json\n",
        r#"{"uuid":"u3","name":"Acme"}"#,
        "\n",
    );

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn json_lines_skip_blank_and_broken_lines() {
        let (rows, skipped) = parse_json_lines::<OrgRow>(ORG_LINES.as_bytes());
        assert_eq!(rows.len(), 3);
        assert_eq!(skipped, 1);
        assert_eq!(rows[0].extra["country_code"], "USA");
        assert_eq!(rows[1].homepage_url, None);
        assert_eq!(rows[2].homepage_url, None);
    }

    #[test]
    fn mistyped_columns_keep_the_row() {
        let lines = concat!(
            r#"{"org_uuid":"u1","investor_count":3,"announced_on":"2019-05-01","investment_type":"series_a","raised_amount_usd":12000000.0}"#,
            "\n",
            r#"{"org_uuid":"abc","investment_type":"seed","raised_amount_usd":"1000000"}"#,
            "\n",
            r#"{"org_uuid":"u2","investor_count":"many"}"#,
            "\n",
            r#"["not","a","row"]"#,
        );
        let (rows, skipped) = parse_json_lines::<FundingRoundRow>(lines.as_bytes());
        assert_eq!(rows.len(), 3);
        assert_eq!(skipped, 1);
        assert_eq!(rows[0].investor_count.as_ref().and_then(|n| n.as_u64()), Some(3));
        assert_eq!(rows[1].raised_amount_usd, Some(serde_json::json!("1000000")));
        assert_eq!(rows[1].announced_on, None);
        assert_eq!(rows[2].investor_count, Some(serde_json::json!("many")));

        let (orgs, skipped) = parse_json_lines::<OrgRow>(
            br#"{"uuid":"u","name":1234,"homepage_url":"https://1234.com"}"#,
        );
        assert_eq!((orgs.len(), skipped), (1, 0));
        assert_eq!(orgs[0].name, Some(serde_json::json!(1234)));
    }

    #[test]
    fn decompress_detects_gzip() {
        let plain = b"{\"a\":1}\n".to_vec();
        assert_eq!(decompress(plain.clone()).unwrap(), plain);
        assert_eq!(decompress(gzip(&plain)).unwrap(), plain);
    }

    #[test]
    fn corrupt_gzip_is_a_dataset_error() {
        let mut bytes = gzip(b"{\"a\":1}\n");
        bytes.truncate(12);
        let err = decompress(bytes).unwrap_err();
        assert!(matches!(err, PortfolioError::Dataset(_)));
    }

    #[tokio::test]
    async fn local_store_reads_gzip_objects() {
        let dir = std::env::temp_dir().join(format!("ph-datasets-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("orgs.json.gz"), gzip(ORG_LINES.as_bytes())).unwrap();

        let store = DatasetStore::local(&dir);
        let rows: Vec<OrgRow> = store.load_rows("orgs.json.gz").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, Some(serde_json::json!("WorkWave")));

        let err = store.load_rows::<OrgRow>("missing.json.gz").await.unwrap_err();
        assert!(matches!(err, PortfolioError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn remote_store_downloads_objects() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bucket/interview-test-org.json.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(ORG_LINES.as_bytes())))
            .mount(&server)
            .await;

        let store = DatasetStore::remote(&format!("{}/bucket/", server.uri()), 5).unwrap();
        let rows: Vec<OrgRow> = store.load_rows("interview-test-org.json.gz").await.unwrap();
        assert_eq!(rows.len(), 3);

        let err = store.fetch_bytes("nope.json.gz").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn config_selects_store() {
        let mut config = DatasetsConfig::default();
        assert!(matches!(
            DatasetStore::from_config(&config, 5).unwrap(),
            DatasetStore::Remote { .. }
        ));

        config.local_dir = Some("/tmp/datasets".into());
        assert!(matches!(
            DatasetStore::from_config(&config, 5).unwrap(),
            DatasetStore::Local { .. }
        ));
    }
}
