//! Core record types flowing through the harvest pipeline.
//!
//! Serialized field names follow the historical result files
//! (`entry`, `exit`, `company_details_path`, `logo`) so consumers of earlier
//! output keep working.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// Which portfolio listing to harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portfolio {
    /// Companies currently held.
    Current,
    /// Exited companies.
    Divested,
}

impl Portfolio {
    /// Both portfolios, in harvest order.
    pub const ALL: [Portfolio; 2] = [Portfolio::Current, Portfolio::Divested];

    /// Path of the listing page relative to the site origin.
    pub fn listing_path(&self) -> &'static str {
        match self {
            Self::Current => "/current-portfolio/",
            Self::Divested => "/current-portfolio/divestments/",
        }
    }
}

impl std::fmt::Display for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Divested => f.write_str("divested"),
        }
    }
}

// ---------------------------------------------------------------------------
// Company records
// ---------------------------------------------------------------------------

/// One row of the portfolio listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub title: String,
    pub sector: Option<String>,
    pub country: Option<String>,
    /// Fund names, in listing order.
    pub fund: Vec<String>,
    #[serde(rename = "entry")]
    pub entry_date: Option<String>,
    #[serde(rename = "exit")]
    pub exit_date: Option<String>,
    /// Site-relative path of the detail page (e.g. `/current-portfolio/acme/`).
    #[serde(rename = "company_details_path")]
    pub detail_path: Option<String>,
}

/// A board or management seat on a detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonRole {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Linked person document, passed through untouched.
    #[serde(default)]
    pub person: Option<Value>,
}

/// Extended fields from a company's detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyDetail {
    pub description: Option<String>,
    pub preamble: Option<String>,
    pub heading: Option<String>,
    pub responsible_advisors: Vec<String>,
    pub website: Option<String>,
    /// Registrable domain of `website`; half of the organization join key.
    pub registered_domain: Option<String>,
    pub board: Vec<PersonRole>,
    pub management: Vec<PersonRole>,
    #[serde(rename = "logo")]
    pub logo_url: Option<String>,
}

/// A listing row plus its detail page, if one was fetched.
///
/// Serializes flat: summary fields first, detail fields only when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(flatten)]
    pub summary: CompanySummary,
    #[serde(flatten)]
    pub detail: Option<CompanyDetail>,
}

impl CompanyRecord {
    /// A record that only carries listing fields.
    pub fn bare(summary: CompanySummary) -> Self {
        Self {
            summary,
            detail: None,
        }
    }

    /// Registrable domain from the detail page, if any.
    pub fn registered_domain(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.registered_domain.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Reference organizations
// ---------------------------------------------------------------------------

/// A raw organization row as loaded from the reference dataset.
///
/// Every column is optional and kept as raw JSON, so a value of an
/// unexpected type never costs the row. Unknown columns are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrgRow {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub homepage_url: Option<Value>,
    /// Only string values act as a funding-round key.
    #[serde(default)]
    pub uuid: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cleaned organization row with its derived registrable domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrg {
    pub name: Option<Value>,
    /// Never null; rows without a homepage are dropped before this stage.
    pub homepage_url: Value,
    pub registered_domain: Option<String>,
    pub uuid: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReferenceOrg {
    /// The organization name, when it is a string.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    /// The organization identifier, when it is a string.
    pub fn uuid_str(&self) -> Option<&str> {
        self.uuid.as_ref().and_then(Value::as_str)
    }
}

impl From<ReferenceOrg> for OrgRow {
    fn from(org: ReferenceOrg) -> Self {
        Self {
            name: org.name,
            homepage_url: Some(org.homepage_url),
            uuid: org.uuid,
            extra: org.extra,
        }
    }
}

// ---------------------------------------------------------------------------
// Funding rounds
// ---------------------------------------------------------------------------

/// A raw funding-round row from the enrichment dataset.
///
/// Columns are raw JSON and passed through as found.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FundingRoundRow {
    #[serde(default)]
    pub org_uuid: Option<Value>,
    #[serde(default)]
    pub investor_count: Option<Value>,
    #[serde(default)]
    pub announced_on: Option<Value>,
    #[serde(default)]
    pub investment_type: Option<Value>,
    #[serde(default)]
    pub raised_amount_usd: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The projection of a funding round attached to an enriched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRound {
    pub investor_count: Option<Value>,
    pub announced_on: Option<Value>,
    pub investment_type: Option<Value>,
    pub raised_amount_usd: Option<Value>,
}

impl From<&FundingRoundRow> for FundingRound {
    fn from(row: &FundingRoundRow) -> Self {
        Self {
            investor_count: row.investor_count.clone(),
            announced_on: row.announced_on.clone(),
            investment_type: row.investment_type.clone(),
            raised_amount_usd: row.raised_amount_usd.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// Final pipeline output: a company, its matched organization, its funding rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub company: CompanyRecord,
    /// `null` when no organization matched.
    pub organization: Option<ReferenceOrg>,
    /// Absent only when funding-round attachment was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_rounds: Option<Vec<FundingRound>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> CompanySummary {
        CompanySummary {
            title: "WorkWave".into(),
            sector: Some("Technology".into()),
            country: Some("United States".into()),
            fund: vec!["EQT IX".into(), "EQT VIII".into()],
            entry_date: Some("2020-08-14".into()),
            exit_date: None,
            detail_path: Some("/current-portfolio/workwave/".into()),
        }
    }

    #[test]
    fn bare_record_serializes_summary_keys_only() {
        let record = CompanyRecord::bare(summary());
        let value = serde_json::to_value(&record).expect("serialize");
        let obj = value.as_object().unwrap();

        assert_eq!(obj["title"], "WorkWave");
        assert_eq!(obj["entry"], "2020-08-14");
        assert!(obj["exit"].is_null());
        assert_eq!(obj["company_details_path"], "/current-portfolio/workwave/");
        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("registered_domain"));
        assert_eq!(obj.len(), 7);
    }

    #[test]
    fn detail_fields_are_flattened() {
        let record = CompanyRecord {
            summary: summary(),
            detail: Some(CompanyDetail {
                website: Some("https://www.workwave.com".into()),
                registered_domain: Some("workwave.com".into()),
                logo_url: Some("https://cdn.example.com/logo.png".into()),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["registered_domain"], "workwave.com");
        assert_eq!(value["logo"], "https://cdn.example.com/logo.png");
        assert_eq!(record.registered_domain(), Some("workwave.com"));
    }

    #[test]
    fn org_row_keeps_passthrough_columns() {
        let line = r#"{"uuid":"abc","name":"WorkWave","homepage_url":"https://workwave.com","country_code":"USA","employee_count":"501-1000"}"#;
        let row: OrgRow = serde_json::from_str(line).expect("parse");
        assert_eq!(row.name, Some(Value::from("WorkWave")));
        assert_eq!(row.extra["country_code"], "USA");
        assert_eq!(row.extra.len(), 2);
    }

    #[test]
    fn non_string_uuid_is_not_a_key() {
        let org = ReferenceOrg {
            name: Some("Acme".into()),
            homepage_url: "https://acme.com".into(),
            registered_domain: Some("acme.com".into()),
            uuid: Some(Value::from(42)),
            extra: Map::new(),
        };
        assert_eq!(org.uuid_str(), None);
        assert_eq!(org.name_str(), Some("Acme"));
    }

    #[test]
    fn mistyped_columns_keep_the_row() {
        let line = r#"{"uuid":"u","name":1234,"homepage_url":"https://1234.com"}"#;
        let row: OrgRow = serde_json::from_str(line).expect("parse");
        assert_eq!(row.name, Some(Value::from(1234)));

        let line = r#"{"org_uuid":"abc","investment_type":"seed","raised_amount_usd":"1000000","investor_count":null}"#;
        let row: FundingRoundRow = serde_json::from_str(line).expect("parse");
        let round = FundingRound::from(&row);
        assert_eq!(round.raised_amount_usd, Some(Value::from("1000000")));
        assert_eq!(round.investor_count, None);
    }

    #[test]
    fn skipped_funding_rounds_are_omitted() {
        let record = EnrichedRecord {
            company: CompanyRecord::bare(summary()),
            organization: None,
            funding_rounds: None,
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert!(value["organization"].is_null());
        assert!(value.get("funding_rounds").is_none());

        let record = EnrichedRecord {
            funding_rounds: Some(vec![]),
            ..record
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["funding_rounds"], serde_json::json!([]));
    }

    #[test]
    fn portfolio_listing_paths() {
        assert_eq!(Portfolio::Current.listing_path(), "/current-portfolio/");
        assert_eq!(Portfolio::Divested.to_string(), "divested");
    }
}
