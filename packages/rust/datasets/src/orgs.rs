//! Reference organization cleanup: derive the registrable domain and
//! collapse duplicate `(name, registered_domain)` rows.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, instrument};

use portfolio_shared::{OrgRow, ReferenceOrg, normalize_domain};

/// Clean raw organization rows into join-ready [`ReferenceOrg`]s.
///
/// Rows without a `homepage_url` are dropped. Each surviving row gets the
/// registrable domain of its homepage (none when the homepage is not a
/// string). Rows sharing a `(name, registered_domain)`
/// key collapse to the last one seen; survivors keep their input order.
/// Absent name and absent domain compare equal to themselves.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn load_and_dedupe(rows: Vec<OrgRow>) -> Vec<ReferenceOrg> {
    let total = rows.len();

    let orgs: Vec<ReferenceOrg> = rows
        .into_iter()
        .filter_map(|row| {
            let homepage_url = row.homepage_url?;
            let registered_domain = normalize_domain(homepage_url.as_str());
            Some(ReferenceOrg {
                name: row.name,
                homepage_url,
                registered_domain,
                uuid: row.uuid,
                extra: row.extra,
            })
        })
        .collect();
    let with_homepage = orgs.len();

    let keep = {
        // Names compare by their JSON text, so `1234` and `"1234"` differ.
        let mut last: HashMap<(Option<String>, Option<&str>), usize> = HashMap::new();
        for (i, org) in orgs.iter().enumerate() {
            let name = org.name.as_ref().map(Value::to_string);
            last.insert((name, org.registered_domain.as_deref()), i);
        }
        let mut keep = vec![false; orgs.len()];
        for i in last.into_values() {
            keep[i] = true;
        }
        keep
    };

    let deduped: Vec<ReferenceOrg> = orgs
        .into_iter()
        .zip(keep)
        .filter_map(|(org, kept)| kept.then_some(org))
        .collect();

    info!(
        rows = total,
        without_homepage = total - with_homepage,
        duplicates = with_homepage - deduped.len(),
        organizations = deduped.len(),
        "reference organizations cleaned"
    );

    deduped
}
