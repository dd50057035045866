mod args;

use anyhow::{Context, Result};
use retro8080::{AliasPolicy, Emulator, EmulatorConfig, StopReason};

use crate::args::{Command, Options, USAGE};

fn main() -> Result<()> {
    env_logger::init();

    let options = match args::parse(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Run(options) => options,
    };

    let config = EmulatorConfig::builder()
        .alias_policy(if options.strict {
            AliasPolicy::Reject
        } else {
            AliasPolicy::Decode
        })
        .trace(options.trace)
        .build();
    let mut emulator = Emulator::new(config);
    let loaded = load_images(&mut emulator, &options)?;

    if options.disassemble {
        for (start, end) in loaded {
            for (address, text) in retro8080::listing_with(
                emulator.cpu().table(),
                emulator.memory(),
                start..=end,
            ) {
                println!("{:04x}  {}", address, text);
            }
        }
        return Ok(());
    }

    let summary = emulator.run(options.steps)?;
    let stop = match summary.stop {
        StopReason::Halted => "halted".to_string(),
        StopReason::Faulted(fault) => format!("faulted: {}", fault),
        StopReason::BudgetExhausted => "step budget exhausted".to_string(),
        StopReason::Cancelled => "cancelled".to_string(),
    };
    println!("{} steps, {}", summary.steps, stop);
    println!("{}", emulator.state());
    Ok(())
}

/// Load every image and return the inclusive address range each occupies.
fn load_images(emulator: &mut Emulator, options: &Options) -> Result<Vec<(u16, u16)>> {
    let mut loaded = Vec::new();
    for image in &options.images {
        log::info!("loading '{}' at {:04x}", image.path.display(), image.offset);
        let data = std::fs::read(&image.path)
            .with_context(|| format!("failed to read ROM '{}'", image.path.display()))?;
        emulator
            .load(&data, image.offset)
            .with_context(|| format!("failed to load '{}'", image.path.display()))?;
        if !data.is_empty() {
            let end = image.offset + data.len() - 1;
            loaded.push((image.offset as u16, end as u16));
        }
    }
    Ok(loaded)
}
