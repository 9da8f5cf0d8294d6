//! Object storage: public URLs and uploads for product images.

use tracing::{info, instrument};

use crate::client::SupabaseClient;
use crate::error::GatewayError;

/// Percent-encode each `/`-separated segment of an object path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl SupabaseClient {
    /// Public URL of an object in the image bucket.
    ///
    /// Returns `None` for a blank path.
    #[must_use]
    pub fn public_url(&self, path: &str) -> Option<String> {
        let encoded = encode_path(path.trim());
        if encoded.is_empty() {
            return None;
        }
        Some(format!(
            "{}storage/v1/object/public/{}/{encoded}",
            self.base(),
            self.bucket()
        ))
    }

    /// Upload `bytes` to `path` in the image bucket and return the stored path.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the upload is rejected (e.g. path exists).
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let url = self.endpoint(&format!(
            "storage/v1/object/{}/{}",
            self.bucket(),
            encode_path(path)
        ))?;
        let request = self
            .http()
            .post(url)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        self.send(request, &format!("storage {path}")).await?;
        info!(path, "Uploaded object");
        Ok(path.to_string())
    }
}
