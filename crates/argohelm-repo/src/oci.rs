//! OCI registry client
//!
//! Pull-only, anonymous access. The chart is the Helm content layer of
//! `<registry>/<path>/<chart>:<version>`.

use oci_distribution::Reference;
use oci_distribution::client::{Client, ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth;
use std::path::Path;

use crate::archive::extract_chart_archive;
use crate::error::{RepoError, Result};

/// Media types for Helm charts in OCI
pub mod media_types {
    /// Helm chart config
    pub const HELM_CONFIG: &str = "application/vnd.cncf.helm.config.v1+json";
    /// Helm chart content layer
    pub const HELM_CONTENT: &str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";
}

/// OCI registry client
pub struct OciRegistry {
    /// Registry plus repository path, without scheme
    base: String,
    client: Client,
    auth: RegistryAuth,
}

impl OciRegistry {
    pub fn new(url: &str) -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            ..Default::default()
        };

        Self {
            base: url
                .trim_start_matches("oci://")
                .trim_end_matches('/')
                .to_string(),
            client: Client::new(config),
            auth: RegistryAuth::Anonymous,
        }
    }

    /// Parse an OCI reference string
    ///
    /// Format: oci://registry/repo:tag or registry/repo:tag
    pub fn parse_reference(reference: &str) -> Result<Reference> {
        let clean = reference
            .trim_start_matches("oci://")
            .trim_start_matches("https://")
            .trim_start_matches("http://");

        Reference::try_from(clean).map_err(|e| RepoError::InvalidOciReference {
            reference: format!("{}: {}", reference, e),
        })
    }

    /// Build an OCI reference from chart name and tag
    ///
    /// `ghcr.io/org/charts` + `nginx` + `1.0.0` -> `ghcr.io/org/charts/nginx:1.0.0`
    pub fn build_reference(&self, name: &str, tag: &str) -> Result<Reference> {
        Self::parse_reference(&format!("{}/{}:{}", self.base, name, tag))
    }

    /// Pull a chart archive from the registry
    pub async fn pull(&self, name: &str, tag: &str) -> Result<Vec<u8>> {
        let reference = self.build_reference(name, tag)?;
        tracing::debug!("Pulling oci://{}", reference);

        let image_data = self
            .client
            .pull(
                &reference,
                &self.auth,
                vec![media_types::HELM_CONFIG, media_types::HELM_CONTENT],
            )
            .await
            .map_err(|e| RepoError::OciError {
                message: format!("Failed to pull {}: {}", reference, e),
            })?;

        let chart_layer = image_data
            .layers
            .into_iter()
            .find(|l| l.media_type == media_types::HELM_CONTENT)
            .ok_or_else(|| RepoError::OciError {
                message: "No chart content layer found in manifest".to_string(),
            })?;

        Ok(chart_layer.data)
    }

    /// Pull and extract a chart under `dest`
    pub async fn pull_to(&self, name: &str, tag: &str, dest: &Path) -> Result<()> {
        let data = self.pull(name, tag).await?;
        extract_chart_archive(&data, dest)
    }
}
