//! `bfdgen machines`: list the machine identifiers declared in the header.

use anyhow::{Context, Result};
use bfdgen_core::extract;
use bfdgen_pipeline::Stage;

use super::Format;
use crate::settings::Settings;

pub fn run(settings: &Settings, format: Format) -> Result<()> {
    let machines = extract(&settings.header, &settings.grammar).context(Stage::Header)?;

    match format {
        Format::Human => {
            for machine in &machines {
                println!("{:<28} {:>6}  {}", machine.name, machine.value, machine.comment);
            }
            println!();
            println!("{} machine identifiers in {}", machines.len(), settings.header.display());
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&machines)?),
    }
    Ok(())
}
