//! `bfdgen probe`: report which header candidates the installed libopcodes supports.

use anyhow::Result;
use bfdgen_pipeline::{discover, ProgressObserver, Silent};
use bfdgen_toolchain::SystemRunner;

use super::{ConsoleObserver, Format};
use crate::settings::Settings;

pub fn run(settings: &Settings, format: Format) -> Result<()> {
    let config = settings.pipeline_config();
    let mut observer: Box<dyn ProgressObserver> = match format {
        Format::Human => Box::new(ConsoleObserver),
        Format::Json => Box::new(Silent),
    };
    let discovery = discover(&config, &SystemRunner, observer.as_mut()).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(stage)
    })?;

    match format {
        Format::Human => {
            println!();
            for entry in &discovery.entries {
                println!(
                    "{:<20} {:<3} {}",
                    entry.bfd_name,
                    if entry.supported { "yes" } else { "no" },
                    entry.machine.comment
                );
            }
            println!();
            println!(
                "{} of {} architectures supported",
                discovery.supported_count(),
                discovery.entries.len()
            );
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&discovery.entries)?),
    }
    Ok(())
}
