//! Writing responses to stdout or a file.

use dataqc_core::{DataQcError, Result};
use serde::Serialize;
use std::path::Path;

/// Renders a document as pretty JSON.
pub fn render<T: Serialize>(document: &T) -> Result<String> {
    serde_json::to_string_pretty(document)
        .map_err(|e| DataQcError::serialization("Failed to serialize output", e))
}

/// Writes a document to `output_path`, or to stdout when no path is given.
pub async fn emit<T: Serialize>(document: &T, output_path: Option<&Path>) -> Result<()> {
    let json_data = render(document)?;

    match output_path {
        Some(path) => {
            save_json(&json_data, path).await?;
            tracing::info!("Output written to {}", path.display());
        }
        None => println!("{}", json_data),
    }
    Ok(())
}

/// Saves JSON data to file.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, format!("{}\n", json_data))
        .await
        .map_err(|e| DataQcError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })?;
    Ok(())
}
