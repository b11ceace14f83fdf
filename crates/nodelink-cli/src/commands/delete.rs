//! `nodelink delete`: detach a document and delete it

use clap::Args;
use nodelink_core::errors::Result;
use nodelink_core::{DeleteReport, LinkOp};

use super::{canonical, Context};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub collection: String,
    pub uuid: String,

    /// Delete the whole child subtree first, leaves first
    #[arg(long)]
    pub cascade: bool,
}

pub fn execute(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let entity_class = ctx.entity_class(&args.collection)?;
    let document = ctx.fetch(&args.collection, &args.uuid)?;
    let fields = canonical(&document);

    ctx.validate_before_write(&fields)?;
    let sync = ctx.synchronizer();

    let report = if args.cascade {
        ctx.walker.delete_tree(&fields, entity_class)?
    } else {
        sync.update_parent_references(&fields, entity_class, LinkOp::Remove)?;
        sync.update_child_references(&fields, entity_class, LinkOp::Remove)?;
        ctx.repository(&args.collection)?
            .delete_by_uuid(&args.uuid)?;
        DeleteReport {
            deleted: vec![document.node_ref()],
            ..DeleteReport::default()
        }
    };

    for node in &report.deleted {
        println!("deleted {}", node);
    }
    for node in &report.skipped {
        println!("skipped {}", node);
    }
    Ok(())
}
