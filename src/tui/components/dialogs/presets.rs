//! Ready-made dialogs for the writing desk
//!
//! The desk needs three dialogs: a danger confirmation for deleting an item,
//! and creation forms for stories and containers. They differ only in
//! configuration and schema, so all of them run on the same controller.

use super::types::{DialogConfig, DialogSize, DialogVariant};
use super::validation::{FieldRule, FieldSpec, FormSchema};

/// Predefined dialog IDs
pub mod dialog_ids {
    pub const DELETE_ITEM: &str = "delete_item";
    pub const NEW_STORY: &str = "new_story";
    pub const NEW_CONTAINER: &str = "new_container";
    pub const CONFIRM: &str = "confirm";
}

/// Maximum summary/description length accepted by the creation forms
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Generic confirmation prompt
pub fn confirmation(
    title: impl Into<String>,
    message: impl Into<String>,
    variant: DialogVariant,
) -> DialogConfig {
    DialogConfig::new(dialog_ids::CONFIRM, title)
        .with_message(message)
        .with_variant(variant)
}

/// Danger prompt for deleting a named item
pub fn delete_confirmation(item_name: &str) -> DialogConfig {
    DialogConfig::new(dialog_ids::DELETE_ITEM, "Delete item")
        .with_message(format!(
            "Delete \"{}\"? This cannot be undone.",
            item_name.trim()
        ))
        .with_variant(DialogVariant::Danger)
        .with_labels("Delete", "Cancel")
}

/// Creation form for a story; the title is required
pub fn new_story() -> (DialogConfig, FormSchema) {
    let config = DialogConfig::new(dialog_ids::NEW_STORY, "New story")
        .with_variant(DialogVariant::Info)
        .with_labels("Create", "Cancel")
        .with_size(DialogSize::FitContent {
            min_width: 50,
            min_height: 9,
        });

    let schema = FormSchema::new(
        FieldSpec::new("title", "Title")
            .with_placeholder("Untitled story")
            .rule(FieldRule::required("Title is required")),
    )
    .field(
        FieldSpec::new("summary", "Summary")
            .with_placeholder("Optional")
            .rule(FieldRule::max_length(
                MAX_DESCRIPTION_LEN,
                format!("Summary must be at most {} characters", MAX_DESCRIPTION_LEN),
            )),
    );

    (config, schema)
}

/// Creation form for a container (a folder of stories)
pub fn new_container() -> (DialogConfig, FormSchema) {
    let config = DialogConfig::new(dialog_ids::NEW_CONTAINER, "New container")
        .with_variant(DialogVariant::Info)
        .with_labels("Create", "Cancel")
        .with_size(DialogSize::FitContent {
            min_width: 50,
            min_height: 9,
        });

    let schema = FormSchema::new(
        FieldSpec::new("name", "Name")
            .with_placeholder("e.g. Drafts")
            .rule(FieldRule::required("Name is required"))
            .rule(FieldRule::min_length(2, "Name must be at least 2 characters")),
    )
    .field(
        FieldSpec::new("description", "Description")
            .with_placeholder("Optional")
            .rule(FieldRule::max_length(
                MAX_DESCRIPTION_LEN,
                format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
            )),
    );

    (config, schema)
}
