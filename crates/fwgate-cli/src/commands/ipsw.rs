//! Ipsw commands - query firmware images

use anyhow::Result;
use fwgate_index::MetadataClient;

use crate::output::{format_size, FirmwareRow, OutputContext};

/// List firmwares of one version across all devices
pub async fn ipsw_version(client: &MetadataClient, version: &str, ctx: &OutputContext) -> Result<()> {
    let firmwares = client.list_firmwares_for_version(version).await?;
    let rows: Vec<FirmwareRow> = firmwares.iter().map(FirmwareRow::from).collect();
    ctx.print(&rows, &firmwares);
    Ok(())
}

/// Show one firmware
pub async fn ipsw_get(
    client: &MetadataClient,
    identifier: &str,
    build: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let fw = client.get_firmware(identifier, build).await?;

    ctx.print_kv(
        &[
            ("Device", fw.identifier.clone()),
            ("Version", fw.version.clone()),
            ("Build", fw.build_id.clone()),
            ("Size", format_size(fw.file_size)),
            ("Signed", if fw.signed { "yes" } else { "no" }.to_string()),
            ("SHA1", fw.sha1.clone()),
            ("MD5", fw.md5.clone()),
            ("URL", fw.url.clone()),
        ],
        &fw,
    );
    Ok(())
}
