//! `bfdgen generate`: run the full pipeline.

use anyhow::Result;
use bfdgen_pipeline::{generate, ProgressObserver, Silent};
use bfdgen_toolchain::SystemRunner;

use super::{ConsoleObserver, Format};
use crate::settings::Settings;

pub fn run(settings: &Settings, format: Format) -> Result<()> {
    let config = settings.pipeline_config();
    log::debug!("{config:?}");

    let mut observer: Box<dyn ProgressObserver> = match format {
        Format::Human => Box::new(ConsoleObserver),
        Format::Json => Box::new(Silent),
    };
    let output = generate(&config, &SystemRunner, observer.as_mut()).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(stage)
    })?;

    match format {
        Format::Human => {
            println!();
            print!("{}", output.report);
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&output.report)?),
    }
    Ok(())
}
