//! JSON data file consumed by the typst templates

use crate::config::DocumentConfig;
use crate::models::{Customer, DocumentPayload, Job};
use crate::Result;
use std::path::PathBuf;
use tracing::debug;

/// Serialize `{"customer": .., "jobs": [..]}` to the document's data file.
///
/// The file is overwritten in place. Non-ASCII text is written as UTF-8,
/// never `\u` escaped.
pub async fn write_payload(
    config: &DocumentConfig,
    customer: &Customer,
    jobs: &[Job],
) -> Result<PathBuf> {
    let payload = DocumentPayload {
        customer: customer.clone(),
        jobs: jobs.to_vec(),
    };

    let bytes = serde_json::to_vec(&payload)?;
    let path = config.payload_path();

    tokio::fs::write(&path, &bytes).await?;

    debug!(
        kind = %config.kind,
        path = %path.display(),
        jobs = jobs.len(),
        "Document payload written"
    );

    Ok(path)
}
