//! Command-line interface for grammar-types
//! Parses files with the standard grammar types and writes the values back.
//!
//! Usage:
//!   grammar-types parse --type `<name>` [--json] `<path>`   - Print the canonical value
//!   grammar-types reformat --type `<name>` `<path>`         - Parse and write the value back
//!   grammar-types types                                  - List the standard types

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Read;

use grammar_types::types::standard;
use grammar_types::{GrammarContext, GrammarError, GrammarType, Result, TypeRef, Value};

fn main() {
    pretty_env_logger::init();

    let matches = Command::new("grammar-types")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for parsing and rewriting values of configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("YAML file with the grammar settings (whitespace, trailing newlines)"),
        )
        .subcommand(
            input_command("parse", "Parse a file and print its value").arg(
                Arg::new("json")
                    .long("json")
                    .help("Print the value as JSON")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(input_command("reformat", "Parse a file and write the value back"))
        .subcommand(Command::new("types").about("List the standard grammar types"))
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// A subcommand reading a file with a standard type
fn input_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(
            Arg::new("type")
                .long("type")
                .short('t')
                .help("Name of the standard grammar type (see `types`)")
                .required(true),
        )
        .arg(
            Arg::new("path")
                .help("Path to the file to parse, or - for stdin")
                .default_value("-")
                .index(1),
        )
}

fn run(matches: &ArgMatches) -> Result<()> {
    let ctx = match matches.get_one::<String>("config") {
        Some(path) => GrammarContext::from_yaml_file(path)?,
        None => GrammarContext::default(),
    };
    match matches.subcommand() {
        Some(("parse", parse_matches)) => {
            let (ty, value) = parse_input(parse_matches, &ctx)?;
            if parse_matches.get_flag("json") {
                let json = serde_json::to_string_pretty(&value).map_err(std::io::Error::from)?;
                println!("{}", json);
            } else {
                println!("{}", value);
                log::debug!("Parsed as {}", ty.type_name());
            }
            Ok(())
        }
        Some(("reformat", reformat_matches)) => {
            let (ty, value) = parse_input(reformat_matches, &ctx)?;
            ty.print(&value);
            Ok(())
        }
        Some(("types", _)) => {
            handle_types_command();
            Ok(())
        }
        _ => unreachable!(),
    }
}

/// Parse the input of a subcommand with the requested type
fn parse_input(matches: &ArgMatches, ctx: &GrammarContext) -> Result<(TypeRef, Value)> {
    let name = matches
        .get_one::<String>("type")
        .map(String::as_str)
        .unwrap_or_default();
    let ty = standard::by_name(name).ok_or_else(|| GrammarError::UnknownType(format!("name {}", name)))?;
    let path = matches.get_one::<String>("path").map(String::as_str).unwrap_or("-");
    let source = if path == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        source
    } else {
        std::fs::read_to_string(path)?
    };
    let value = ty.parse_with(&source, ctx, true)?;
    Ok((ty, value))
}

/// Handle the types command
fn handle_types_command() {
    println!("Standard grammar types:\n");
    for name in standard::names() {
        if let Some(ty) = standard::by_name(name) {
            println!("  {:<16} {}", name, ty.grammar_name());
        }
    }
}
