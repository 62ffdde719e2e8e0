//! Content comparison between a local file and its remote record.
//!
//! Exactly one comparator is used per run:
//! - `BlobShaComparator` hashes the local bytes the way git does and compares
//!   against the blob sha the API reports for every file.
//! - `RawBytesComparator` compares against inline content, which the API only
//!   returns for files up to 1 MB; larger files always count as changed.

use super::api::RemoteFileRecord;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt::Write as _;

/// Decides whether local content matches what is stored remotely.
pub trait ContentComparator: Send + Sync {
    /// Short name used in logs and config (`blob-sha`, `bytes`)
    fn name(&self) -> &'static str;

    /// `true` if `local` is identical to the remote record's content.
    fn matches(&self, local: &[u8], remote: &RemoteFileRecord) -> bool;
}

/// Git object id of a blob: SHA-1 over `blob <len>\0` followed by the bytes.
pub fn git_blob_sha(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);

    let mut hex = String::with_capacity(40);
    for byte in hasher.finalize() {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Compares git blob hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobShaComparator;

impl ContentComparator for BlobShaComparator {
    fn name(&self) -> &'static str {
        "blob-sha"
    }

    fn matches(&self, local: &[u8], remote: &RemoteFileRecord) -> bool {
        git_blob_sha(local).eq_ignore_ascii_case(&remote.sha)
    }
}

/// Compares decoded remote content byte for byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawBytesComparator;

impl ContentComparator for RawBytesComparator {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn matches(&self, local: &[u8], remote: &RemoteFileRecord) -> bool {
        remote.content.as_deref() == Some(local)
    }
}

/// Comparator selection in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    #[default]
    BlobSha,
    Bytes,
}

impl CompareMode {
    pub fn comparator(self) -> Box<dyn ContentComparator> {
        match self {
            Self::BlobSha => Box::new(BlobShaComparator),
            Self::Bytes => Box::new(RawBytesComparator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sha: &str, content: Option<&[u8]>) -> RemoteFileRecord {
        RemoteFileRecord {
            path: "a.txt".to_string(),
            sha: sha.to_string(),
            size: content.map_or(0, |c| c.len() as u64),
            content: content.map(<[u8]>::to_vec),
        }
    }

    #[test]
    fn test_git_blob_sha_known_values() {
        // Same ids `git hash-object` prints
        assert_eq!(git_blob_sha(b""), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        assert_eq!(
            git_blob_sha(b"hello\n"),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_blob_sha_comparator() {
        let cmp = BlobShaComparator;
        let remote = record("ce013625030ba8dba906f756967f9e9ca394464a", None);
        assert!(cmp.matches(b"hello\n", &remote));
        assert!(!cmp.matches(b"hello", &remote));
    }

    #[test]
    fn test_blob_sha_is_not_plain_sha1() {
        // sha1("hello\n") without the blob header must not count as a match
        let cmp = BlobShaComparator;
        let remote = record("f572d396fae9206628714fb2ce00f72e94f2258f", None);
        assert!(!cmp.matches(b"hello\n", &remote));
    }

    #[test]
    fn test_raw_bytes_comparator() {
        let cmp = RawBytesComparator;
        assert!(cmp.matches(b"data", &record("x", Some(b"data"))));
        assert!(!cmp.matches(b"data", &record("x", Some(b"other"))));
        // No inline content: treated as changed
        assert!(!cmp.matches(b"data", &record("x", None)));
    }

    #[test]
    fn test_compare_mode_parsing() {
        #[derive(Deserialize)]
        struct Wrapper {
            compare: CompareMode,
        }
        let w: Wrapper = toml::from_str("compare = \"bytes\"").unwrap();
        assert_eq!(w.compare, CompareMode::Bytes);
        let w: Wrapper = toml::from_str("compare = \"blob-sha\"").unwrap();
        assert_eq!(w.compare, CompareMode::BlobSha);
        assert_eq!(w.compare.comparator().name(), "blob-sha");
    }
}
