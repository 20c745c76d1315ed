//! Version probe that runs the node binary itself.
//!
//! Cosmos SDK binaries print their version as a single JSON line when run
//! with `version --long --output json`. Wrappers such as cosmovisor add
//! their own log lines around it, so the probe picks the first line that
//! looks like a JSON object instead of decoding the whole output.

use tokio::process::Command;
use tracing::error;

use crate::client::VersionProbe;
use crate::config::BinaryConfig;
use crate::error::FetchError;
use crate::types::VersionInfo;

/// Runs the configured binary and decodes its JSON version output.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryVersionProbe;

impl BinaryVersionProbe {
    pub fn new() -> Self {
        Self
    }
}

impl VersionProbe for BinaryVersionProbe {
    async fn probe_version(&self, binary: &BinaryConfig) -> Result<VersionInfo, FetchError> {
        let output = Command::new(&binary.path)
            .args(&binary.args)
            .output()
            .await
            .map_err(|e| {
                error!(path = %binary.path.display(), error = %e, "could not run binary");
                FetchError::Process(format!("failed to run {}: {e}", binary.path.display()))
            })?;

        // stdout first, then stderr: older SDK versions print the version
        // to stderr.
        let mut raw = String::from_utf8_lossy(&output.stdout).into_owned();
        raw.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            error!(
                path = %binary.path.display(),
                status = %output.status,
                output = %raw,
                "could not get app version"
            );
            return Err(FetchError::Process(format!(
                "{} exited with {}",
                binary.path.display(),
                output.status
            )));
        }

        decode_version(&raw)
    }
}

/// Returns the first line of `output` whose trimmed content starts with `{`
/// and ends with `}`, or the whole `output` if there is none.
///
/// Falling back to the raw output means a missing JSON line surfaces as a
/// decode error rather than an empty version.
pub fn extract_json_line(output: &str) -> &str {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{') && line.ends_with('}'))
        .unwrap_or(output)
}

fn decode_version(raw: &str) -> Result<VersionInfo, FetchError> {
    let json = extract_json_line(raw);
    serde_json::from_str::<VersionInfo>(json).map_err(|e| {
        error!(error = %e, output = %raw, "could not decode app version");
        FetchError::Decode(e)
    })
}
