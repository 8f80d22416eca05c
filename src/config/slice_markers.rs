use super::{read_json_config, ConfigMap};
use crate::error::Result;
use crate::volume::ElementType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct SliceMarkersOutput {
    pub edges_png: PathBuf,
    pub lines_json: PathBuf,
}

/// Run configuration of the `slice_markers` tool.
#[derive(Clone, Debug, Deserialize)]
pub struct SliceMarkersConfig {
    pub input: PathBuf,
    /// Z index of the slice to inspect.
    #[serde(default)]
    pub slice: usize,
    #[serde(default = "default_element_type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub params: ConfigMap,
    pub output: SliceMarkersOutput,
}

fn default_element_type() -> ElementType {
    ElementType::U16
}

pub fn load_config(path: &Path) -> Result<SliceMarkersConfig> {
    read_json_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_are_required() {
        let ok: SliceMarkersConfig = serde_json::from_str(
            r#"{"input": "a.png", "slice": 3,
                "output": {"edges_png": "e.png", "lines_json": "l.json"}}"#,
        )
        .unwrap();
        assert_eq!(ok.slice, 3);
        assert_eq!(ok.element_type, ElementType::U16);
        assert!(serde_json::from_str::<SliceMarkersConfig>(r#"{"input": "a.png"}"#).is_err());
    }
}
