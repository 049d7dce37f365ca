//! `ecofan validate`: run a full pass and report, without emitting.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ecofan_components::builtin;
use ecofan_emit::{compile, EmitError, PassOptions};

pub fn run(file: &Path, options: &PassOptions) -> Result<()> {
    let document = crate::document::load(file)?;
    match compile(&document, &builtin(), options) {
        Ok(out) => {
            println!("{}: ok", file.display());
            println!("{}", out.report);
            Ok(())
        }
        Err(EmitError::Validation(report)) => {
            for err in &report.errors {
                eprintln!("  {err}");
            }
            bail!(
                "{}: {} validation error(s)",
                file.display(),
                report.len()
            )
        }
        Err(other) => Err(other).with_context(|| format!("checking {}", file.display())),
    }
}
