//! Remote wire format.
//!
//! The remote store keeps a resume as `{id, title, content, owner}` where
//! `content` is a single JSON string encoding
//! `{content, formatting, createdAt, updatedAt}`. Encoding and decoding
//! that blob is the client's job, not the gateway's.

use crate::error::CoreResult;
use crate::model::{CallerIdentity, Formatting, Origin, Resume, ResumeContent, ResumeId};
use serde::{Deserialize, Serialize};

/// A resume as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResume {
    /// Resume id.
    pub id: ResumeId,
    /// Title.
    pub title: String,
    /// Encoded [`WireBlob`].
    pub content: String,
    /// Caller that owns the resume.
    pub owner: CallerIdentity,
}

/// The serialized payload stored in [`RemoteResume::content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBlob {
    /// Structured content.
    #[serde(default)]
    pub content: ResumeContent,
    /// Presentation directives.
    #[serde(default)]
    pub formatting: Formatting,
    /// Creation time; absent in blobs written by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Last write time; absent in blobs written by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl From<&Resume> for WireBlob {
    fn from(resume: &Resume) -> Self {
        Self {
            content: resume.content.clone(),
            formatting: resume.formatting.clone(),
            created_at: Some(resume.created_at),
            updated_at: Some(resume.updated_at),
        }
    }
}

/// Encodes the content, formatting and timestamps of a resume into a wire blob.
pub fn encode_blob(resume: &Resume) -> CoreResult<String> {
    Ok(serde_json::to_string(&WireBlob::from(resume))?)
}

/// Decodes a remote resume into a local [`Resume`].
///
/// Missing timestamps are synthesized from `now`. The result is tagged
/// [`Origin::Remote`].
///
/// # Errors
///
/// Returns [`crate::CoreError::Codec`] if the blob is not valid JSON.
pub fn decode_remote(remote: &RemoteResume, now: i64) -> CoreResult<Resume> {
    let blob: WireBlob = serde_json::from_str(&remote.content)?;

    let mut resume = Resume {
        id: remote.id.clone(),
        title: remote.title.clone(),
        content: blob.content,
        formatting: blob.formatting,
        created_at: blob.created_at.unwrap_or(0),
        updated_at: blob.updated_at.unwrap_or(0),
        origin: Origin::Remote,
    };
    resume.normalize_timestamps(now);
    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Experience, Font, SectionType};

    fn remote(id: &str, content: &str) -> RemoteResume {
        RemoteResume {
            id: ResumeId::from(id),
            title: "Remote CV".to_string(),
            content: content.to_string(),
            owner: CallerIdentity::new("caller-1"),
        }
    }

    fn sample() -> Resume {
        let mut resume = Resume::new(ResumeId::from("r-1"), "Engineer", 1_000);
        resume.updated_at = 2_000;
        resume.origin = Origin::Remote;
        resume.content.summary = "Builds things".to_string();
        resume.content.experience.push(Experience {
            id: "1_abcdefg".to_string(),
            company: "Acme".to_string(),
            current: true,
            ..Experience::default()
        });
        resume.formatting.font = Font::Lora;
        resume.formatting.section_order = vec![SectionType::Experience, SectionType::Summary];
        resume
    }

    #[test]
    fn blob_uses_camel_case_keys() {
        let blob = encode_blob(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["createdAt"], 1_000);
        assert_eq!(value["updatedAt"], 2_000);
        assert!(value.get("content").is_some());
        assert!(value.get("formatting").is_some());
        assert!(value.get("origin").is_none());
    }

    #[test]
    fn decode_round_trips_sample() {
        let original = sample();
        let wire = RemoteResume {
            id: original.id.clone(),
            title: original.title.clone(),
            content: encode_blob(&original).unwrap(),
            owner: CallerIdentity::new("caller-1"),
        };
        assert_eq!(decode_remote(&wire, 9_999).unwrap(), original);
    }

    #[test]
    fn decode_synthesizes_missing_timestamps() {
        let resume = decode_remote(&remote("r-2", r#"{"content":{},"formatting":{}}"#), 777).unwrap();
        assert_eq!(resume.created_at, 777);
        assert_eq!(resume.updated_at, 777);
        assert_eq!(resume.origin, Origin::Remote);
    }

    #[test]
    fn decode_tolerates_missing_formatting() {
        let resume = decode_remote(&remote("r-3", r#"{"content":{"summary":"x"}}"#), 1).unwrap();
        assert_eq!(resume.formatting, Formatting::default());
        assert_eq!(resume.content.summary, "x");
    }

    #[test]
    fn decode_rejects_malformed_blob() {
        let result = decode_remote(&remote("r-4", "not json"), 1);
        assert!(matches!(result, Err(crate::CoreError::Codec(_))));
    }
}
