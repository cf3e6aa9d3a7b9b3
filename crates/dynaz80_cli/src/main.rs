use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use dynaz80_cli::{Platform, RunOptions};

const USAGE: &str = "usage: dynaz80 <z80|gb> <image> [load-address]";

fn parse_address(text: &str) -> Result<u16> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid load address '{text}'"))
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let platform_name = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let Some(platform) = Platform::from_name(&platform_name) else {
        bail!("unknown platform '{platform_name}'. Supported: z80, gb");
    };
    let image_path = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let load_address = args.next().map(|a| parse_address(&a)).transpose()?;

    log::info!("Running image: '{}'", image_path);
    let image = std::fs::read(&image_path)
        .with_context(|| format!("failed to read image '{image_path}'"))?;

    let options = RunOptions::builder()
        .platform(platform)
        .image(image)
        .load_address(load_address.unwrap_or_default())
        .build();
    let summary = dynaz80_cli::run(options)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&summary.output)?;
    if !summary.output.ends_with(b"\n") && !summary.output.is_empty() {
        writeln!(stdout)?;
    }

    let r = &summary.registers;
    log::info!(
        "stopped ({:?}) after {} T-states at PC={:#06X} SP={:#06X} AF={:#06X} BC={:#06X} DE={:#06X} HL={:#06X}",
        summary.stop,
        summary.clock,
        r.pc,
        r.sp,
        r.af(),
        r.bc(),
        r.de(),
        r.hl()
    );
    log::info!(
        "cache: {} compilations, {:.1}% hit ratio, {} invalidations",
        summary.cache.compilations,
        summary.cache.hit_ratio() * 100.0,
        summary.cache.invalidations
    );
    Ok(())
}
