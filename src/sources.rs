use anyhow::Result;

use crate::config::Config;
use crate::connector_fs::JsonDirSource;

/// Print each configured sheet and whether its file is present.
pub fn list_sources(config: &Config) -> Result<()> {
    let source = JsonDirSource::from_config(config);

    if !source.root().exists() {
        println!(
            "source directory {} does not exist",
            source.root().display()
        );
    }

    println!("{:<16} {:<12} FILE", "SHEET", "STATUS");
    for (batch, path) in source.files() {
        let status = if path.is_file() { "OK" } else { "MISSING" };
        println!("{:<16} {:<12} {}", batch.to_string(), status, path.display());
    }

    Ok(())
}
