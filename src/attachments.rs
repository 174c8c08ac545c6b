//! Question attachments and best-effort content resolution
//!
//! Attachments reference files already held by the storage service; the
//! submission payload carries their base64 content when it can be
//! fetched. Content resolution is fail-soft: a download error leaves the
//! attachment without content rather than aborting the submission.

use crate::backend::QaBackend;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Descriptor for one file attached to a question
///
/// `file_key` is the storage-service reference used to fetch content;
/// `content` is filled in (base64) during submission when the download
/// succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Display name of the attached file
    pub file_name: String,

    /// Storage-service key used to download the content
    pub file_key: String,

    /// MIME type, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Base64-encoded content, present when resolution succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Attachment {
    /// Creates an attachment descriptor with no content
    pub fn new(file_name: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_key: file_key.into(),
            content_type: None,
            content: None,
        }
    }
}

/// Resolves attachment content through the backend download endpoint
///
/// Each attachment is fetched independently; a failure is logged and the
/// attachment keeps `content: None`. Already resolved attachments are
/// left untouched.
pub async fn resolve_attachments(backend: &dyn QaBackend, attachments: &mut [Attachment]) {
    for attachment in attachments.iter_mut() {
        if attachment.content.is_some() {
            continue;
        }
        match backend.download_attachment(&attachment.file_key).await {
            Ok(content) => {
                debug!(
                    file_name = %attachment.file_name,
                    bytes = content.len(),
                    "resolved attachment content"
                );
                attachment.content = Some(content);
            }
            Err(e) => {
                warn!(
                    file_name = %attachment.file_name,
                    error = %e,
                    "failed to resolve attachment content, submitting without it"
                );
            }
        }
    }
}
