use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Space Invaders ROM parts and where each one is mapped.
pub const INVADERS_SET: [(&str, usize); 4] = [
    ("invaders.h", 0x0000),
    ("invaders.g", 0x0800),
    ("invaders.f", 0x1000),
    ("invaders.e", 0x1800),
];

pub const DEFAULT_STEPS: u64 = 1_000_000;

pub const USAGE: &str = "\
usage: retro8080 [options] <rom[@offset]>... | <invaders-dir>

options:
  --steps N       stop after N instructions (default 1000000)
  --trace         log every instruction at trace level (RUST_LOG=trace)
  --disassemble   print a listing of the loaded images instead of running
  --strict        treat undocumented opcodes as faults
  -h, --help      show this message";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub path: PathBuf,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub images: Vec<Image>,
    pub steps: u64,
    pub trace: bool,
    pub disassemble: bool,
    pub strict: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Options),
    Help,
}

pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options {
        images: Vec::new(),
        steps: DEFAULT_STEPS,
        trace: false,
        disassemble: false,
        strict: false,
    };
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--trace" => options.trace = true,
            "--disassemble" => options.disassemble = true,
            "--strict" => options.strict = true,
            "--steps" => {
                let value = args.next().context("--steps needs a value")?;
                options.steps = parse_number(&value)
                    .with_context(|| format!("invalid step count '{}'", value))?;
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            image => options.images.extend(expand(image)?),
        }
    }

    if options.images.is_empty() {
        bail!("no ROM given\n\n{}", USAGE);
    }
    Ok(Command::Run(options))
}

/// Turn one positional argument into the images it names.
fn expand(arg: &str) -> Result<Vec<Image>> {
    let (path, offset) = match arg.rsplit_once('@') {
        Some((path, offset)) => {
            let offset = parse_number(offset)
                .with_context(|| format!("invalid load offset in '{}'", arg))?;
            (PathBuf::from(path), Some(offset as usize))
        }
        None => (PathBuf::from(arg), None),
    };

    if path.is_dir() {
        if offset.is_some() {
            bail!(
                "'{}' is a ROM set directory; its parts have fixed offsets",
                arg
            );
        }
        return Ok(INVADERS_SET
            .iter()
            .map(|(name, offset)| Image {
                path: path.join(name),
                offset: *offset,
            })
            .collect());
    }
    Ok(vec![Image {
        path,
        offset: offset.unwrap_or(0),
    }])
}

/// Decimal, or hex with a `0x` or `$` prefix.
fn parse_number(text: &str) -> Result<u64> {
    let value = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        text.parse()?
    };
    Ok(value)
}
