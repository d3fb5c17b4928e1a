//! argohelm engine - rendering through `helm template`
//!
//! - `Helm`: runs `helm template` and captures the manifest stream
//! - `decode_secrets`: optional base64 decoding of Secret data
//! - `manifest`: manifest files and key sorting for diffs

pub mod error;
pub mod helm;
pub mod manifest;
pub mod secrets;

pub use error::{EngineError, Result};
pub use helm::Helm;
pub use manifest::{sort_yaml_file, write_manifest};
pub use secrets::decode_secrets;

use std::path::Path;

/// Renders a chart, optionally decoding Secret data
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    helm: Helm,
    decode_secrets: bool,
}

impl Renderer {
    pub fn new(helm: Helm) -> Self {
        Self {
            helm,
            decode_secrets: false,
        }
    }

    /// Decode base64 Secret data in the output
    pub fn decode_secrets(mut self, decode: bool) -> Self {
        self.decode_secrets = decode;
        self
    }

    /// Render `chart` with the given `helm template` arguments
    pub fn render(&self, chart: &Path, args: &[String]) -> Result<String> {
        let output = self.helm.template(chart, args)?;
        if self.decode_secrets {
            tracing::debug!("Post-processing Secrets to decode base64 values...");
            Ok(secrets::decode_secrets(&output))
        } else {
            Ok(output)
        }
    }
}
