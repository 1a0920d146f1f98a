//! Registrable-domain normalization.
//!
//! Both halves of the company/organization join key go through
//! [`normalize_domain`], so its output must stay identical for identical input.

use url::{Host, Url};

/// Map a URL-ish string to its registrable domain (`www.example.co.uk` → `example.co.uk`).
///
/// Returns `None` for missing or blank input, inputs without a DNS host
/// (IP literals, `mailto:` and friends), and hosts whose suffix is not on the
/// public suffix list. Only ICANN suffixes count; hosting platforms from the
/// private section (`acme.github.io`) resolve to the platform domain. Scheme-less input (`www.example.com/about`) is accepted.
pub fn normalize_domain(url: Option<&str>) -> Option<String> {
    let raw = url?.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}")).ok()?,
        Err(_) => return None,
    };

    let host = match parsed.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };

    let suffix = icann_suffix(&host)?;
    let rest = host.strip_suffix(suffix)?.strip_suffix('.')?;
    let label = rest.rsplit('.').next()?;
    if label.is_empty() {
        return None;
    }

    Some(format!("{label}.{suffix}"))
}

/// The public (ICANN) suffix of `host`.
///
/// Private-section rules (`github.io`, `herokuapp.com`, ...) are not
/// registries for this purpose: when one matches, its leftmost label is
/// dropped and the lookup repeats until an ICANN rule matches.
fn icann_suffix(host: &str) -> Option<&str> {
    let mut candidate = host;
    loop {
        let suffix = psl::suffix(candidate.as_bytes())?;
        if !suffix.is_known() {
            return None;
        }
        let matched = &host[host.len() - suffix.as_bytes().len()..];
        match suffix.typ() {
            Some(psl::Type::Private) => candidate = matched.split_once('.')?.1,
            _ => return Some(matched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_subdomain_and_path() {
        assert_eq!(
            normalize_domain(Some("https://www.example.co.uk/path?x=1")).as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(
            normalize_domain(Some("https://firststudentinc.com/")).as_deref(),
            Some("firststudentinc.com")
        );
        assert_eq!(
            normalize_domain(Some("http://shop.eu.acme.de:8080/de/")).as_deref(),
            Some("acme.de")
        );
    }

    #[test]
    fn missing_and_empty_are_none() {
        assert_eq!(normalize_domain(None), None);
        assert_eq!(normalize_domain(Some("")), None);
        assert_eq!(normalize_domain(Some("   ")), None);
    }

    #[test]
    fn scheme_less_input_is_accepted() {
        assert_eq!(
            normalize_domain(Some("www.workwave.com/about")).as_deref(),
            Some("workwave.com")
        );
    }

    #[test]
    fn host_case_is_folded() {
        assert_eq!(
            normalize_domain(Some("HTTPS://WWW.ManyPets.COM")).as_deref(),
            Some("manypets.com")
        );
    }

    #[test]
    fn ip_hosts_and_non_urls_are_none() {
        assert_eq!(normalize_domain(Some("http://192.168.1.1/admin")), None);
        assert_eq!(normalize_domain(Some("mailto:info@example.com")), None);
        assert_eq!(normalize_domain(Some("not a url")), None);
    }

    #[test]
    fn private_suffixes_are_not_registries() {
        assert_eq!(
            normalize_domain(Some("https://myapp.herokuapp.com/")).as_deref(),
            Some("herokuapp.com")
        );
        assert_eq!(
            normalize_domain(Some("acme.github.io/site")).as_deref(),
            Some("github.io")
        );
        assert_eq!(
            normalize_domain(Some("https://foo.github.io")).as_deref(),
            Some("github.io")
        );
        assert_eq!(
            normalize_domain(Some("http://shop.blogspot.com")).as_deref(),
            Some("blogspot.com")
        );
        assert_eq!(
            normalize_domain(Some("https://github.io")).as_deref(),
            Some("github.io")
        );
    }

    #[test]
    fn bare_suffix_and_unknown_tld_are_none() {
        assert_eq!(normalize_domain(Some("https://co.uk/")), None);
        assert_eq!(normalize_domain(Some("http://intranet.localdomain")), None);
    }

    #[test]
    fn deterministic_across_calls() {
        let url = Some("https://investors.example.com.au/reports");
        let first = normalize_domain(url);
        assert_eq!(first.as_deref(), Some("example.com.au"));
        assert_eq!(first, normalize_domain(url));
    }
}
