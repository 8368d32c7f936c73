//! `berth build-ext` command

use anyhow::{Context, Result};

use crate::cli::{BuildExtArgs, MessageFormat};
use berth::builder::events::BuildEvent;
use berth::core::manifest::{find_manifest, Manifest, MANIFEST_NAME};
use berth::ops::build_ext::{build_ext_with_events, BuildExtOptions};
use berth::util::diagnostic::suggestions;
use berth::util::fs::relative_path;
use berth::util::SystemRunner;

pub fn execute(args: BuildExtArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    let manifest_path = match args.manifest_path {
        Some(path) => path,
        None => find_manifest(&cwd).with_context(|| {
            format!(
                "could not find `{}` in `{}` or any parent directory\n{}",
                MANIFEST_NAME,
                cwd.display(),
                suggestions::NO_MANIFEST
            )
        })?,
    };
    let manifest = Manifest::load(&manifest_path)?;

    let opts = BuildExtOptions {
        build_lib: args.build_lib,
        build_temp: args.build_temp,
        ext_suffix: args.ext_suffix,
        interpreter: args.interpreter,
        cmake: args.cmake,
        build_type: args.build_type,
        jobs: args.jobs,
        no_verify: args.no_verify,
    };

    // JSON events are written as the session reaches each step.
    let json = args.message_format == MessageFormat::Json;
    let mut print_event = |event: BuildEvent| {
        if json {
            println!("{}", event.to_json());
        }
    };
    let report = build_ext_with_events(&manifest, &opts, &SystemRunner, &mut print_event)?;

    let artifacts = report.into_result()?;

    if args.message_format == MessageFormat::Human {
        for artifact in &artifacts {
            eprintln!(
                "    Finished `{}` -> {}",
                artifact.target,
                relative_path(&cwd, &artifact.path).display()
            );
        }
    }

    Ok(())
}
