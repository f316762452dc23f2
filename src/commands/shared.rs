//! # Shared Command Utilities
//!
//! Argument parsing and the request helpers the `person` and `film` commands
//! have in common.

use handled::Handle;
use serde_json::Value;

use crate::app::collect_pairs;
use crate::commands::errors::{IdParseError, PairParseError, UserError};
use crate::schema::Params;
use crate::{cli_utils, http_utils};

fn exit_with_user_error<E>(error: E, fallback: &str) -> !
where
    E: Handle<UserError> + std::fmt::Display,
{
    match error.handle() {
        Some(UserError {
            message,
            usage_hint: Some(hint),
        }) => cli_utils::exit_with_usage_error(&message, &hint),
        Some(user_error) => cli_utils::exit_with_error(&user_error.message),
        None => cli_utils::exit_with_error(&format!("{}: {}", fallback, error)),
    }
}

/// Parses a row id, which must be a positive integer.
pub fn parse_id(input: &str) -> Result<i64, IdParseError> {
    match input.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(IdParseError {
            input: input.to_string(),
        }),
    }
}

/// Parses a row id or exits with an error message.
pub fn parse_id_or_exit(input: &str) -> i64 {
    parse_id(input).unwrap_or_else(|e| exit_with_user_error(e, "Invalid id"))
}

/// Splits `key=value` arguments; the value may be empty.
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>, PairParseError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(PairParseError { input: arg.clone() }),
        })
        .collect()
}

/// Parses `key=value` arguments into request parameters or exits.
pub fn parse_params_or_exit(args: &[String]) -> Params {
    match parse_pairs(args) {
        Ok(pairs) => collect_pairs(pairs),
        Err(e) => exit_with_user_error(e, "Invalid parameter"),
    }
}

/// Parses `key=value` arguments into query pairs or exits.
pub fn parse_query_or_exit(args: &[String]) -> Vec<(String, String)> {
    parse_pairs(args).unwrap_or_else(|e| exit_with_user_error(e, "Invalid parameter"))
}

/// Validates both minimum and maximum argument counts.
///
/// # Arguments
/// * `args` - The command arguments array
/// * `min_count` - The minimum number of arguments required (including subcommand)
/// * `max_count` - The maximum number of arguments allowed (including subcommand)
/// * `command` - The command name for error message
/// * `usage` - The usage string to display
pub fn validate_args_count_or_exit(
    args: &[String],
    min_count: usize,
    max_count: usize,
    command: &str,
    usage: &str,
) {
    if args.len() < min_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command requires more arguments", command),
            usage,
        );
    }
    if args.len() > max_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command has too many arguments", command),
            usage,
        );
    }
}

/// Macro to generate command dispatcher boilerplate.
macro_rules! dispatch_command {
    ($command_name:expr, $usage:expr, $args:expr, $client:expr, $output_format:expr, {
        $($subcommand:expr => $handler:expr),* $(,)?
    }) => {
        if $args.is_empty() {
            crate::cli_utils::exit_with_usage_error(
                &format!("{} command requires a subcommand", $command_name),
                $usage,
            );
        }

        match $args[0].as_str() {
            $(
                $subcommand => $handler($args, $client, $output_format).await,
            )*
            _ => {
                let available_subcommands = vec![$($subcommand),*];
                crate::cli_utils::exit_with_error(&format!(
                    "Unknown {} subcommand '{}'. Available subcommands: {}",
                    $command_name,
                    $args[0],
                    available_subcommands.join(", ")
                ));
            }
        }
    };
}

pub(crate) use dispatch_command;

/// One catalog collection as seen from the command line.
pub struct Resource {
    /// Singular name used in messages, e.g. `person`.
    pub singular: &'static str,
    /// Plural name used in messages, e.g. `people`.
    pub plural: &'static str,
    /// Collection path below `/api/v1/`.
    pub collection: &'static str,
    /// The required text field the create command takes positionally.
    pub label: &'static str,
}

impl Resource {
    fn row_path(&self, id: i64) -> String {
        format!("{}{}/", self.collection, id)
    }

    /// `<create> <label> [key=value...]`
    pub async fn create(&self, args: &[String], client: &http_utils::CatalogClient) {
        if args.len() < 2 {
            cli_utils::exit_with_usage_error(
                "create command requires more arguments",
                &format!(
                    "Usage: ncmdbctl {} create <{}> [key=value...]",
                    self.singular, self.label
                ),
            );
        }
        let mut params = parse_params_or_exit(&args[2..]);
        params.insert(self.label.to_string(), Value::String(args[1].clone()));

        let response = http_utils::execute_or_exit(
            || client.post::<Params, Value>(self.collection, &params),
            &format!("Failed to create {}", self.singular),
        )
        .await;
        println!("Created {}: {}", self.singular, response["id"]);
    }

    /// `<list> [key=value...]`
    pub async fn list(
        &self,
        args: &[String],
        client: &http_utils::CatalogClient,
        output_format: cli_utils::OutputFormat,
    ) {
        let query = parse_query_or_exit(&args[1..]);
        let records = http_utils::execute_or_exit(
            || client.get_optional::<Vec<Value>>(self.collection, &query),
            &format!("Failed to list {}", self.plural),
        )
        .await
        .unwrap_or_default();

        if records.is_empty() {
            println!("No {} found", self.plural);
        } else {
            cli_utils::print_formatted_or_exit(&records, output_format, self.plural);
        }
    }

    /// `<get> <id> [field...]`
    pub async fn get(
        &self,
        args: &[String],
        client: &http_utils::CatalogClient,
        output_format: cli_utils::OutputFormat,
    ) {
        if args.len() < 2 {
            cli_utils::exit_with_usage_error(
                "get command requires more arguments",
                &format!("Usage: ncmdbctl {} get <id> [field...]", self.singular),
            );
        }
        let id = parse_id_or_exit(&args[1]);
        let query: Vec<(String, String)> = args[2..]
            .iter()
            .map(|field| ("fields".to_string(), field.clone()))
            .collect();

        let path = self.row_path(id);
        let record = http_utils::execute_or_exit(
            || client.get_optional::<Value>(&path, &query),
            &format!("Failed to get {}", self.singular),
        )
        .await;
        match record {
            Some(record) => cli_utils::print_formatted_or_exit(&record, output_format, self.singular),
            None => cli_utils::exit_with_error(&format!("No {} with id {}", self.singular, id)),
        }
    }

    /// `<update> <id> key=value...`
    pub async fn update(
        &self,
        args: &[String],
        client: &http_utils::CatalogClient,
        output_format: cli_utils::OutputFormat,
    ) {
        if args.len() < 3 {
            cli_utils::exit_with_usage_error(
                "update command requires more arguments",
                &format!("Usage: ncmdbctl {} update <id> key=value...", self.singular),
            );
        }
        let id = parse_id_or_exit(&args[1]);
        let params = parse_params_or_exit(&args[2..]);

        let path = self.row_path(id);
        let record = http_utils::execute_or_exit(
            || client.put::<Params, Value>(&path, &params),
            &format!("Failed to update {}", self.singular),
        )
        .await;
        cli_utils::print_formatted_or_exit(&record, output_format, self.singular);
    }

    /// `<delete> <id>`
    pub async fn delete(&self, args: &[String], client: &http_utils::CatalogClient) {
        validate_args_count_or_exit(
            args,
            2,
            2,
            "delete",
            &format!("Usage: ncmdbctl {} delete <id>", self.singular),
        );
        let id = parse_id_or_exit(&args[1]);

        let path = self.row_path(id);
        http_utils::execute_or_exit(
            || client.delete(&path),
            &format!("Failed to delete {}", self.singular),
        )
        .await;
        println!("Deleted {}: {}", self.singular, id);
    }
}
