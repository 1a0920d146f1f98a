//! Left join of company records onto reference organizations, and
//! funding-round attachment by organization identifier.

use std::collections::HashMap;

use tracing::{info, instrument};

use portfolio_shared::{
    CompanyRecord, EnrichedRecord, FundingRound, FundingRoundRow, ReferenceOrg,
};

/// Left-join `records` onto `orgs` by `(registered_domain, title == name)`.
///
/// Comparison is exact and case-sensitive. A record or org without a
/// registrable domain, or an org whose name is not a string, never matches. Every record yields exactly one output
/// row, in input order; unmatched rows carry `organization: None`.
///
/// `orgs` is expected to be deduplicated; if a key still repeats, the last
/// org with that key is the one matched.
#[instrument(skip_all, fields(records = records.len(), orgs = orgs.len()))]
pub fn join(records: Vec<CompanyRecord>, orgs: &[ReferenceOrg]) -> Vec<EnrichedRecord> {
    let index: HashMap<(&str, &str), &ReferenceOrg> = orgs
        .iter()
        .filter_map(|org| {
            let domain = org.registered_domain.as_deref()?;
            let name = org.name_str()?;
            Some(((domain, name), org))
        })
        .collect();

    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|company| {
            let organization = company
                .registered_domain()
                .and_then(|domain| index.get(&(domain, company.summary.title.as_str())))
                .map(|org| (*org).clone());
            EnrichedRecord {
                company,
                organization,
                funding_rounds: None,
            }
        })
        .collect();

    let matched = enriched.iter().filter(|r| r.organization.is_some()).count();
    info!(
        records = enriched.len(),
        matched,
        unmatched = enriched.len() - matched,
        "joined reference organizations"
    );

    enriched
}

/// Attach the funding rounds of each row's matched organization.
///
/// Rounds are matched on `org_uuid == organization.uuid` (string equality)
/// and kept in dataset order. Rows without a match, or whose org uuid is not
/// a string, get an empty list.
#[instrument(skip_all, fields(records = records.len(), rounds = rounds.len()))]
pub fn attach_funding_rounds(
    records: Vec<EnrichedRecord>,
    rounds: &[FundingRoundRow],
) -> Vec<EnrichedRecord> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, round) in rounds.iter().enumerate() {
        if let Some(uuid) = round.org_uuid.as_ref().and_then(|v| v.as_str()) {
            index.entry(uuid).or_default().push(i);
        }
    }

    let mut attached = 0usize;
    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|mut record| {
            let funding: Vec<FundingRound> = record
                .organization
                .as_ref()
                .and_then(ReferenceOrg::uuid_str)
                .and_then(|uuid| index.get(uuid))
                .map(|hits| hits.iter().map(|&i| FundingRound::from(&rounds[i])).collect())
                .unwrap_or_default();
            attached += funding.len();
            record.funding_rounds = Some(funding);
            record
        })
        .collect();

    info!(
        records = enriched.len(),
        funding_rounds = attached,
        "attached funding rounds"
    );

    enriched
}
