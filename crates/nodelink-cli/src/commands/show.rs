//! `nodelink show`: print a document, optionally expanded

use clap::Args;
use nodelink_core::errors::Result;
use nodelink_core::traversal::NoopVisitor;
use nodelink_core::Expansion;

use super::{canonical, print_fields, Context};

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub collection: String,
    pub uuid: String,

    /// Expand child_nodes recursively
    #[arg(long)]
    pub tree: bool,

    /// Expand parent_nodes one level
    #[arg(long)]
    pub parents: bool,
}

pub fn execute(ctx: &Context, args: ShowArgs) -> Result<()> {
    let mut fields = canonical(&ctx.fetch(&args.collection, &args.uuid)?);

    let mut expansions = Vec::new();
    if args.tree {
        expansions.push(Expansion::child_tree());
    }
    if args.parents {
        expansions.push(Expansion::immediate_parents());
    }
    for expansion in &expansions {
        fields = ctx.walker.load_nodes_data(
            &fields,
            &args.collection,
            None::<&()>,
            expansion,
            &mut NoopVisitor,
        )?;
    }

    print_fields(fields)
}
