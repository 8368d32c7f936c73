//! `berth toolchain` command

use anyhow::Result;

use crate::cli::ToolchainArgs;
use berth::builder::toolchain::ToolchainProbe;
use berth::util::SystemRunner;

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let probe = match args.cmake {
        Some(path) => ToolchainProbe::new(path),
        None => ToolchainProbe::cmake(),
    };

    let version = probe.check_available(&SystemRunner)?;

    println!("Toolchain:");
    println!();
    println!("  CMake:    {}", probe.program().display());
    println!("  Version:  {}", version);
    println!("  Required: >= {}", probe.minimum());

    Ok(())
}
