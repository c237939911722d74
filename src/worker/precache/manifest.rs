use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::platform::environment;
use crate::worker::error::{invalid_argument, WorkerResult};

/// One build artifact to precache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheEntry {
    pub url: String,
    /// Content revision. `None` when the URL itself is versioned (hashed file names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl PrecacheEntry {
    pub fn new(url: impl Into<String>, revision: Option<String>) -> Self {
        Self {
            url: url.into(),
            revision,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Url(String),
    Entry(PrecacheEntry),
}

impl From<RawEntry> for PrecacheEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Url(url) => PrecacheEntry::new(url, None),
            RawEntry::Entry(entry) => entry,
        }
    }
}

/// The build-time list of assets served from the precache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrecacheManifest {
    entries: Vec<PrecacheEntry>,
}

impl PrecacheManifest {
    pub fn new(entries: Vec<PrecacheEntry>) -> Self {
        Self { entries }
    }

    /// Parses a JSON array whose items are URL strings or `{url, revision}` objects.
    /// Blank input is an empty manifest.
    pub fn from_json_str(raw: &str) -> WorkerResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| invalid_argument(format!("Invalid precache manifest: {err}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> WorkerResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw: Vec<RawEntry> = serde_json::from_value(value)
            .map_err(|err| invalid_argument(format!("Invalid precache manifest: {err}")))?;
        Ok(Self::new(raw.into_iter().map(PrecacheEntry::from).collect()))
    }

    /// The manifest injected by the build, or an empty one.
    pub fn from_environment() -> WorkerResult<Self> {
        match environment::injected_manifest() {
            Some(value) => Self::from_value(value),
            None => Ok(Self::default()),
        }
    }

    /// Builds an entry whose revision is the SHA-256 of the asset contents.
    pub fn entry_for_asset(url: impl Into<String>, contents: &[u8]) -> PrecacheEntry {
        let digest = Sha256::digest(contents);
        let revision = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        PrecacheEntry::new(url, Some(revision))
    }

    pub fn push(&mut self, entry: PrecacheEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PrecacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_string(&self) -> WorkerResult<String> {
        serde_json::to_string(&self.entries)
            .map_err(|err| invalid_argument(format!("Failed to serialise manifest: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strings_and_objects() {
        let manifest = PrecacheManifest::from_json_str(
            r#"["/assets/app.3f9a.js", {"url": "/index.html", "revision": "abc"}, {"url": "/offline.html", "revision": null}]"#,
        )
        .unwrap();
        assert_eq!(
            manifest.entries(),
            &[
                PrecacheEntry::new("/assets/app.3f9a.js", None),
                PrecacheEntry::new("/index.html", Some("abc".into())),
                PrecacheEntry::new("/offline.html", None),
            ]
        );
    }

    #[test]
    fn blank_and_null_are_empty() {
        assert!(PrecacheManifest::from_json_str("  ").unwrap().is_empty());
        assert!(PrecacheManifest::from_json_str("null").unwrap().is_empty());
        assert!(PrecacheManifest::from_json_str("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array() {
        let err = PrecacheManifest::from_json_str(r#"{"url": "/"}"#).unwrap_err();
        assert_eq!(err.code_str(), "sw/invalid-argument");
    }

    #[test]
    fn asset_revision_is_sha256_hex() {
        let entry = PrecacheManifest::entry_for_asset("/index.html", b"abc");
        assert_eq!(
            entry.revision.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn serialises_back_to_manifest_json() {
        let mut manifest = PrecacheManifest::default();
        manifest.push(PrecacheEntry::new("/a.js", None));
        manifest.push(PrecacheEntry::new("/b.html", Some("1".into())));
        assert_eq!(
            manifest.to_json_string().unwrap(),
            r#"[{"url":"/a.js"},{"url":"/b.html","revision":"1"}]"#
        );
    }
}
