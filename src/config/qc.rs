use super::{read_json_config, ConfigMap};
use crate::error::Result;
use crate::pipeline::MaskingMode;
use crate::volume::ElementType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// `single` processes `input` itself; `batch` every brain directory below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Single,
    Batch,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QcOutputConfig {
    pub mask_dir: Option<PathBuf>,
    pub volume_dir: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QcToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub masking: MaskingMode,
    #[serde(default = "default_element_type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub output: QcOutputConfig,
    /// Flat parameter map forwarded to every stage.
    #[serde(default)]
    pub params: ConfigMap,
}

fn default_element_type() -> ElementType {
    ElementType::U16
}

pub fn load_config(path: &Path) -> Result<QcToolConfig> {
    read_json_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: QcToolConfig = serde_json::from_str(r#"{"input": "brain/RES(8x4x2)"}"#).unwrap();
        assert_eq!(config.mode, RunMode::Single);
        assert_eq!(config.masking, MaskingMode::Remove);
        assert_eq!(config.element_type, ElementType::U16);
        assert!(config.output.mask_dir.is_none());
        assert!(config.params.is_empty());
    }

    #[test]
    fn full_config_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qc.json");
        std::fs::write(
            &path,
            r#"{
                "input": "/data/brains",
                "mode": "batch",
                "masking": "isolate",
                "element_type": "u8",
                "output": {"mask_dir": "out/mask", "report_json": "out/report.json"},
                "params": {"se1": 7, "cannyMax": "0.4"}
            }"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.mode, RunMode::Batch);
        assert_eq!(config.masking, MaskingMode::Isolate);
        assert_eq!(config.element_type, ElementType::U8);
        assert_eq!(config.output.mask_dir, Some(PathBuf::from("out/mask")));
        assert_eq!(config.params.get("se1"), Some("7"));
        assert!(load_config(&dir.path().join("missing.json")).is_err());
    }
}
