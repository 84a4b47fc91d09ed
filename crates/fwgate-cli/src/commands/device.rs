//! Device commands - query the firmware-index catalog

use anyhow::Result;
use fwgate_index::MetadataClient;

use crate::output::{DeviceRow, FirmwareRow, OutputContext, OutputFormat};

/// List every device in the catalog
pub async fn device_list(client: &MetadataClient, ctx: &OutputContext) -> Result<()> {
    let devices = client.list_devices().await?;
    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    ctx.print(&rows, &devices);
    Ok(())
}

/// Show one device and its firmwares
pub async fn device_get(client: &MetadataClient, identifier: &str, ctx: &OutputContext) -> Result<()> {
    let device = client.get_device(identifier).await?;

    ctx.print_kv(
        &[
            ("Name", device.name.clone()),
            ("Identifier", device.identifier.clone()),
            ("Board", device.board_config.clone()),
            ("Platform", device.platform.clone()),
            ("CPID", format!("{:#06x}", device.cpid)),
            ("BDID", format!("{:#04x}", device.bdid)),
        ],
        &device,
    );

    if ctx.format == OutputFormat::Table && !device.firmwares.is_empty() {
        println!();
        let rows: Vec<FirmwareRow> = device.firmwares.iter().map(FirmwareRow::from).collect();
        ctx.print(&rows, &device.firmwares);
    }
    Ok(())
}
