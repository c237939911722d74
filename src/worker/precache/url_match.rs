//! URL normalisation for precache lookups.

use url::Url;

use crate::worker::constants::REVISION_SEARCH_PARAM;
use crate::worker::settings::PrecacheSettings;

/// Storage key for a precached URL: the URL plus its revision as a search parameter.
pub fn cache_key(url: &Url, revision: Option<&str>) -> String {
    let mut key = without_fragment(url);
    if let Some(revision) = revision {
        key.query_pairs_mut()
            .append_pair(REVISION_SEARCH_PARAM, revision);
    }
    key.into()
}

pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Drops every search parameter matched by `settings.ignore_url_parameters`.
pub fn without_ignored_parameters(url: &Url, settings: &PrecacheSettings) -> Url {
    let mut stripped = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !settings.is_ignored_parameter(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    }
    stripped
}

/// Candidate URLs for a request, in lookup order:
/// the URL without its fragment, then without ignored parameters, then with the
/// directory index appended, then with a `.html` suffix.
pub fn url_variations(url: &Url, settings: &PrecacheSettings) -> Vec<Url> {
    let base = without_fragment(url);
    let stripped = without_ignored_parameters(&base, settings);
    let mut variations = vec![base];
    push_unique(&mut variations, stripped.clone());

    if stripped.path().ends_with('/') {
        if let Some(index) = settings.directory_index.as_deref() {
            let mut indexed = stripped.clone();
            indexed.set_path(&format!("{}{index}", stripped.path()));
            push_unique(&mut variations, indexed);
        }
    } else if settings.clean_urls {
        let mut clean = stripped.clone();
        clean.set_path(&format!("{}.html", stripped.path()));
        push_unique(&mut variations, clean);
    }
    variations
}

fn push_unique(variations: &mut Vec<Url>, candidate: Url) {
    if !variations.contains(&candidate) {
        variations.push(candidate);
    }
}
