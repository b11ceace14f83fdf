//! `nodelink validate`: check a document's references resolve

use clap::Args;
use nodelink_core::errors::Result;

use super::{canonical, Context};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    pub collection: String,
    pub uuid: String,
}

pub fn execute(ctx: &Context, args: ValidateArgs) -> Result<()> {
    let document = ctx.fetch(&args.collection, &args.uuid)?;
    ctx.synchronizer()
        .validate_parent_child_nodes_references(&canonical(&document))?;
    println!("ok {}", document.node_ref());
    Ok(())
}
