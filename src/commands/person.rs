//! # Person Command Handler
//!
//! `ncmdbctl person <create|list|get|update|delete>`.

use crate::{
    cli_utils,
    commands::shared::{Resource, dispatch_command},
    http_utils,
};

const PERSON_USAGE: &str = "Usage: ncmdbctl person <create|list|get|update|delete> [args...]";

const PEOPLE: Resource = Resource {
    singular: "person",
    plural: "people",
    collection: "people/",
    label: "name",
};

/// Handles all person-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `client` - HTTP client for API communication
/// * `output_format` - Output format for get/list/update commands
pub async fn handle_person_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("person", PERSON_USAGE, args, client, output_format, {
        "create" => handle_person_create,
        "list" => handle_person_list,
        "get" => handle_person_get,
        "update" => handle_person_update,
        "delete" => handle_person_delete,
    });
}

async fn handle_person_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    PEOPLE.create(args, client).await;
}

async fn handle_person_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    PEOPLE.list(args, client, output_format).await;
}

async fn handle_person_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    PEOPLE.get(args, client, output_format).await;
}

async fn handle_person_update(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    PEOPLE.update(args, client, output_format).await;
}

async fn handle_person_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    PEOPLE.delete(args, client).await;
}
