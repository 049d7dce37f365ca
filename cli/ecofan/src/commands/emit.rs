//! `ecofan emit`: compile a document into its construction program.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ecofan_components::builtin;
use ecofan_emit::{compile, PassOptions, PassOutput};
use tracing::info;

use crate::Format;

pub fn run(
    file: &Path,
    format: Format,
    output: Option<&Path>,
    options: &PassOptions,
) -> Result<()> {
    let document = crate::document::load(file)?;
    let out = compile(&document, &builtin(), options)
        .with_context(|| format!("compiling {}", file.display()))?;
    let rendered = render(&out, format)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), operations = out.operations.len(), "wrote program");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Text is one operation per line; JSON is `{"operations": [...]}`.
pub fn render(out: &PassOutput, format: Format) -> Result<String> {
    match format {
        Format::Text => {
            let mut text = String::new();
            for op in &out.operations {
                text.push_str(&op.to_string());
                text.push('\n');
            }
            Ok(text)
        }
        Format::Json => {
            let value = serde_json::json!({ "operations": out.operations });
            let mut text = serde_json::to_string_pretty(&value)?;
            text.push('\n');
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = "\
fan:
  - platform: itho_ecofanrft
    name: Bathroom
itho_ecofanrft:
  - id: hub
    irq_pin: GPIO4
    cs_pin: GPIO5
    rf_address: \"01:02:03\"
spi:
  clk_pin: GPIO18
";

    fn document() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        file
    }

    #[test]
    fn writes_text_program_to_file() {
        let input = document();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("program.txt");

        run(input.path(), Format::Text, Some(&output), &PassOptions::default()).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "construct spicomponent_0: SPIComponent()");
        assert_eq!(
            lines.last().copied(),
            Some(r#"register itho_eco_fan_rft_fan_0 as fan-entity (name="Bathroom")"#)
        );
        let hub = lines.iter().position(|l| l.starts_with("construct hub:")).unwrap();
        let fan = lines
            .iter()
            .position(|l| l.starts_with("construct itho_eco_fan_rft_fan_0:"))
            .unwrap();
        assert!(hub < fan);
    }

    #[test]
    fn json_lists_tagged_operations() {
        let input = document();
        let node = crate::document::load(input.path()).unwrap();
        let out = compile(&node, &builtin(), &PassOptions::default()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&render(&out, Format::Json).unwrap()).unwrap();
        let ops = json["operations"].as_array().unwrap();
        assert_eq!(ops.len(), out.operations.len());
        assert_eq!(ops[0]["op"], "construct");
        assert_eq!(ops[0]["id"], "spicomponent_0");
    }

    #[test]
    fn strict_pass_rejects_unknown_keys() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"spi": {"clk_pin": 18, "speed": "fast"}}"#).unwrap();

        let strict = PassOptions {
            unknown_keys: Some(ecofan_schema::UnknownKeys::Reject),
            ..PassOptions::default()
        };
        let err = run(file.path(), Format::Text, None, &strict).unwrap_err();
        assert!(format!("{err:#}").contains("spi.speed"));
        assert!(run(file.path(), Format::Text, None, &PassOptions::default()).is_ok());
    }
}
