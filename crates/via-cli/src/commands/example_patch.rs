//! Factory patch export command.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use via_config::{factory_patch_names, factory_patches, get_factory_patch};

#[derive(Args)]
pub struct ExamplePatchArgs {
    /// Output TOML file
    #[arg(value_name = "OUTPUT", required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Factory patch to write
    #[arg(long, default_value = "wavetable")]
    name: String,

    /// List the factory patches instead of writing one
    #[arg(long)]
    list: bool,
}

pub fn run(args: ExamplePatchArgs) -> anyhow::Result<()> {
    if args.list {
        println!("Factory Patches");
        println!("===============\n");
        for (id, patch) in factory_patch_names().into_iter().zip(factory_patches()) {
            println!(
                "  {:<20} {:<10} {}",
                id,
                patch.module.kind(),
                patch.description.as_deref().unwrap_or("")
            );
        }
        return Ok(());
    }

    let output = args.output.context("no output path given")?;
    let patch = get_factory_patch(&args.name).with_context(|| {
        format!(
            "no factory patch named '{}' (available: {})",
            args.name,
            factory_patch_names().join(", ")
        )
    })?;
    patch.save(&output)?;
    println!("Wrote {} to {}", patch.name, output.display());
    Ok(())
}
