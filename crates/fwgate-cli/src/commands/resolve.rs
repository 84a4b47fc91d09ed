//! Resolve commands - translate between versions and build ids

use anyhow::Result;
use fwgate_index::MetadataClient;

use crate::output::OutputContext;

/// Print the version a build id belongs to
pub async fn resolve_version(client: &MetadataClient, build: &str, ctx: &OutputContext) -> Result<()> {
    let version = client.resolve_version_from_build(build).await?;
    ctx.print_value("version", &version);
    Ok(())
}

/// Print the build id of a version on one device
pub async fn resolve_build(
    client: &MetadataClient,
    version: &str,
    identifier: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let build = client.resolve_build_from_version(version, identifier).await?;
    ctx.print_value("build", &build);
    Ok(())
}
