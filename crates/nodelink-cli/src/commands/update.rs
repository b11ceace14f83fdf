//! `nodelink update`: patch a document and reconcile its references

use std::path::PathBuf;

use clap::Args;
use nodelink_core::errors::Result;

use super::{canonical, print_fields, read_json_object, Context};

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub collection: String,
    pub uuid: String,

    /// JSON object of fields to change; `null` removes a business field
    #[arg(long)]
    pub file: PathBuf,
}

pub fn execute(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let patch = read_json_object(&args.file)?;
    let entity_class = ctx.entity_class(&args.collection)?;

    let mut document = ctx.fetch(&args.collection, &args.uuid)?;
    let old = canonical(&document);
    document.apply_patch(&patch)?;
    ctx.validate_before_write(&canonical(&document))?;

    let new = canonical(&ctx.repository(&args.collection)?.update(document)?);
    let report = ctx
        .synchronizer()
        .compare_and_update_nodes_references(&old, &new, entity_class)?;
    tracing::info!(
        touched = report.touched(),
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "references reconciled"
    );

    print_fields(new)
}
