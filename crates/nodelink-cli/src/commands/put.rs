//! `nodelink put`: create a document and link it into the graph

use std::path::PathBuf;

use clap::Args;
use nodelink_core::errors::Result;
use nodelink_core::model::document::FIELD_UUID;
use nodelink_core::{Document, LinkOp};
use serde_json::Value;

use super::{canonical, print_fields, read_json_object, Context};

#[derive(Debug, Args)]
pub struct PutArgs {
    /// Collection name, e.g. learning_objects
    pub collection: String,

    /// JSON object with the document fields; a uuid is generated if absent
    #[arg(long)]
    pub file: PathBuf,
}

pub fn execute(ctx: &Context, args: PutArgs) -> Result<()> {
    let mut fields = read_json_object(&args.file)?;
    if !fields.contains_key(FIELD_UUID) {
        fields.insert(
            FIELD_UUID.to_string(),
            Value::String(uuid::Uuid::now_v7().to_string()),
        );
    }

    let entity_class = ctx.entity_class(&args.collection)?;
    let sync = ctx.synchronizer();
    ctx.validate_before_write(&fields)?;

    let document = Document::from_fields(&args.collection, &fields)?;
    let saved = canonical(&ctx.repository(&args.collection)?.save(document)?);

    sync.update_parent_references(&saved, entity_class, LinkOp::Add)?;
    sync.update_child_references(&saved, entity_class, LinkOp::Add)?;

    print_fields(saved)
}
