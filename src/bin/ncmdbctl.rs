use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use ncmdb::{
    cli_utils::{self, OutputFormat},
    commands::{handle_film_command, handle_person_command},
    http_utils,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Base URL of the ncmdb server")]
    base_url: String,
    #[arrrg(optional, "Output format for get/list/update commands: json or yaml")]
    output: String,
}

const USAGE: &str = r#"Usage: ncmdbctl [options] <command> [args...]

Options:
  --base-url <url>     Base URL of the ncmdb server (default: http://localhost:8080)
  --output <format>    Output format for get/list/update commands: json or yaml (default: json)

Commands:
  person create <name> [key=value...]      Create a person
  person list [key=value...]               List people matching the filters
  person get <id> [field...]               Get a person, optionally projected
  person update <id> key=value...          Update a person
  person delete <id>                       Delete a person
  film create <title> [key=value...]       Create a film
  film list [key=value...]                 List films matching the filters
  film get <id> [field...]                 Get a film, optionally projected
  film update <id> key=value...            Update a film
  film delete <id>                         Delete a film

Repeat a key to pass a list (cast=1 cast=2).  Pass key= to clear a field."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: ncmdbctl <command> [args...]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No command specified", USAGE);
    }

    let base_url = if options.base_url.is_empty() {
        "http://localhost:8080".to_string()
    } else {
        options.base_url
    };
    let output = if options.output.is_empty() {
        OutputFormat::default()
    } else {
        options
            .output
            .parse::<OutputFormat>()
            .unwrap_or_else(|e| cli_utils::exit_with_usage_error(&e, USAGE))
    };

    let client = http_utils::CatalogClient::new(base_url);

    match free[0].as_str() {
        "person" => {
            handle_person_command(&free[1..], &client, output).await;
        }
        "film" => {
            handle_film_command(&free[1..], &client, output).await;
        }
        _ => {
            cli_utils::exit_with_error(&format!(
                "Unknown command '{}'. Available commands: person, film",
                free[0]
            ));
        }
    }

    Ok(())
}
