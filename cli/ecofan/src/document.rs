//! Loading configuration documents from disk.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ecofan_core::ConfigNode;
use tracing::debug;

/// Source syntax of a document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(other) => bail!(
                "unsupported document extension '.{other}' (expected .yaml, .yml, .toml or .json)"
            ),
            None => bail!("{} has no extension to infer its format from", path.display()),
        }
    }

    /// Decode `text` into a configuration tree. Duplicate keys are rejected.
    pub fn parse(self, text: &str) -> Result<ConfigNode> {
        let node = match self {
            Self::Yaml => serde_yaml::from_str(text)?,
            Self::Toml => toml::from_str(text)?,
            Self::Json => serde_json::from_str(text)?,
        };
        Ok(node)
    }
}

/// Read and decode the document at `path`.
pub fn load(path: &Path) -> Result<ConfigNode> {
    let format = DocumentFormat::from_path(path)?;
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let node = format
        .parse(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), ?format, "loaded document");
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn keys(node: &ConfigNode) -> Vec<&str> {
        node.as_mapping().unwrap().keys().collect()
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")).unwrap(), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.YAML")).unwrap(), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")).unwrap(), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")).unwrap(), DocumentFormat::Json);
        assert!(DocumentFormat::from_path(Path::new("a.ini")).is_err());
        assert!(DocumentFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn yaml_keeps_document_order() {
        let file = write_temp(
            ".yaml",
            "spi:\n  clk_pin: GPIO18\nitho_ecofanrft:\n  - rf_address: \"01:02:03\"\n    irq_pin: 4\n",
        );
        let node = load(file.path()).unwrap();
        assert_eq!(keys(&node), vec!["spi", "itho_ecofanrft"]);

        let hub = &node.as_mapping().unwrap().get("itho_ecofanrft").unwrap().as_sequence().unwrap()[0];
        assert_eq!(hub.as_mapping().unwrap().get("irq_pin"), Some(&ConfigNode::Integer(4)));
    }

    #[test]
    fn toml_and_json_decode_to_the_same_tree() {
        let toml = write_temp(
            ".toml",
            "[spi]\nclk_pin = \"GPIO18\"\n\n[[itho_ecofanrft]]\nrf_address = \"01:02:03\"\nirq_pin = 4\n",
        );
        let json = write_temp(
            ".json",
            r#"{"spi": {"clk_pin": "GPIO18"}, "itho_ecofanrft": [{"rf_address": "01:02:03", "irq_pin": 4}]}"#,
        );
        assert_eq!(load(toml.path()).unwrap(), load(json.path()).unwrap());
    }

    #[test]
    fn duplicate_json_keys_are_rejected() {
        let file = write_temp(".json", r#"{"spi": {}, "spi": {}}"#);
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(Path::new("/nonexistent/ecofan.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("reading /nonexistent/ecofan.yaml"));
    }
}
