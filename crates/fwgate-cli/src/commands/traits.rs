//! Traits commands - embedded device-trait dataset

use anyhow::Result;
use fwgate_traits::{sort_by_product_type, DeviceTraitResolver};

use crate::cli::TraitsCommand;
use crate::output::{OutputContext, TraitRow};

/// Run one traits subcommand against `resolver`
pub fn traits(resolver: &DeviceTraitResolver, command: &TraitsCommand, ctx: &OutputContext) -> Result<()> {
    match command {
        TraitsCommand::List { sorted } => {
            let mut devices = resolver.list_devices()?;
            if *sorted {
                sort_by_product_type(&mut devices);
            }
            let rows: Vec<TraitRow> = devices.iter().map(TraitRow::from).collect();
            ctx.print(&rows, &devices);
        }
        TraitsCommand::Prod { product_type } => {
            let device = resolver.find_by_product_type(product_type)?;
            ctx.print(&[TraitRow::from(&device)], &device);
        }
        TraitsCommand::Model { model } => {
            let device = resolver.find_by_model(model)?;
            ctx.print(&[TraitRow::from(&device)], &device);
        }
        TraitsCommand::Export { path, sorted } => {
            let mut devices = resolver.list_devices()?;
            if *sorted {
                sort_by_product_type(&mut devices);
            }
            DeviceTraitResolver::export_json(&devices, path)?;
            ctx.success(&format!("Exported {} devices to {}", devices.len(), path.display()));
        }
    }
    Ok(())
}
