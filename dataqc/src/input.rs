//! Loading request envelopes, record batches and configuration from disk.

use dataqc_core::{DataQcError, QualityConfig, Result};
use serde_json::Value;
use std::path::Path;

/// Reads a file and parses it as JSON.
pub async fn load_json(path: &Path) -> Result<Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataQcError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        })?;

    serde_json::from_str(&contents).map_err(|e| {
        DataQcError::serialization(format!("Failed to parse JSON in {}", path.display()), e)
    })
}

/// Loads the quality configuration, falling back to defaults.
pub async fn load_config(path: Option<&Path>) -> Result<QualityConfig> {
    let Some(path) = path else {
        return Ok(QualityConfig::default());
    };

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataQcError::Io {
            context: format!("Failed to read configuration {}", path.display()),
            source: e,
        })?;
    let config = QualityConfig::from_json_str(&contents)?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"action": "detect_anomalies", "data": []}"#).unwrap();

        let value = load_json(&path).await.unwrap();
        assert_eq!(value["action"], "detect_anomalies");
    }

    #[tokio::test]
    async fn test_load_json_errors() {
        let dir = TempDir::new().unwrap();
        let missing = load_json(&dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(DataQcError::Io { .. })));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let broken = load_json(&path).await;
        assert!(matches!(broken, Err(DataQcError::Serialization { .. })));
    }

    #[tokio::test]
    async fn test_load_config_defaults_and_file() {
        assert_eq!(load_config(None).await.unwrap(), QualityConfig::default());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataqc.json");
        std::fs::write(
            &path,
            r#"{"validation": {"confidence_threshold": 0.5}, "anomaly_detection": {"enabled": false}}"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).await.unwrap();
        assert!((config.validation.confidence_threshold - 0.5).abs() < 0.001);
        assert!(!config.anomaly_detection.enabled);
    }
}
