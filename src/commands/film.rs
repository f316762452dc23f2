//! # Film Command Handler
//!
//! `ncmdbctl film <create|list|get|update|delete>`.

use crate::{
    cli_utils,
    commands::shared::{Resource, dispatch_command},
    http_utils,
};

const FILM_USAGE: &str = "Usage: ncmdbctl film <create|list|get|update|delete> [args...]";

const FILMS: Resource = Resource {
    singular: "film",
    plural: "films",
    collection: "films/",
    label: "title",
};

/// Handles all film-related commands.
pub async fn handle_film_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("film", FILM_USAGE, args, client, output_format, {
        "create" => handle_film_create,
        "list" => handle_film_list,
        "get" => handle_film_get,
        "update" => handle_film_update,
        "delete" => handle_film_delete,
    });
}

async fn handle_film_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    FILMS.create(args, client).await;
}

async fn handle_film_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    FILMS.list(args, client, output_format).await;
}

async fn handle_film_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    FILMS.get(args, client, output_format).await;
}

async fn handle_film_update(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    FILMS.update(args, client, output_format).await;
}

async fn handle_film_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    FILMS.delete(args, client).await;
}
