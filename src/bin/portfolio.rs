//! Command-line front-end for the portfolio query engine.
//!
//! Loads the data file once (see `portfolio::config` for discovery), runs a
//! single command against the snapshot, and prints the answer as JSON on
//! stdout. Diagnostics go to stderr. Exit status is 0 on success, 1 for usage
//! or load failures, and 2 when the query itself has no answer (unknown id,
//! invalid sort field or order, malformed records).

use anyhow::{Context, Result, anyhow, bail};
use portfolio::{
    Catalog, ProjectId, ProjectSchema, SearchQuery, find_data_file, sanitize_search_term,
    split_list,
};
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

const EXIT_NO_ANSWER: i32 = 2;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse()?;
    let data_path = find_data_file(cli.data.as_deref())?;

    let query = match cli.command {
        Command::Validate => return validate(&data_path),
        Command::Query(query) => query,
    };

    let catalog = Catalog::load(&data_path)?;
    match query {
        QueryCommand::Count => {
            println!("{}", catalog.count());
            Ok(0)
        }
        QueryCommand::Get(id) => match catalog.get_by_id(id) {
            Ok(Some(project)) => {
                print_json(project)?;
                Ok(0)
            }
            Ok(None) => {
                eprintln!("no project with project_no {}", id.0);
                Ok(EXIT_NO_ANSWER)
            }
            Err(err) => no_answer(err),
        },
        QueryCommand::Techniques => match catalog.list_techniques() {
            Ok(techniques) => {
                print_json(&techniques)?;
                Ok(0)
            }
            Err(err) => no_answer(err),
        },
        QueryCommand::Stats(technique) => {
            let stats = match catalog.technique_stats() {
                Ok(stats) => stats,
                Err(err) => return no_answer(err),
            };
            match technique {
                None => print_json(&stats)?,
                Some(name) => match stats.get(&name) {
                    Some(entries) => print_json(entries)?,
                    None => {
                        eprintln!("no project uses technique '{name}'");
                        return Ok(EXIT_NO_ANSWER);
                    }
                },
            }
            Ok(0)
        }
        QueryCommand::Search(query) => match catalog.query(&query) {
            Ok(results) => {
                print_json(&results)?;
                Ok(0)
            }
            Err(err) => no_answer(err),
        },
    }
}

fn validate(data_path: &std::path::Path) -> Result<i32> {
    let schema = ProjectSchema::resolve()?;
    let violations = schema.validate_file(data_path)?;
    if violations.is_empty() {
        eprintln!("{}: ok", data_path.display());
        return Ok(0);
    }
    for violation in &violations {
        let pointer = if violation.pointer.is_empty() {
            "/"
        } else {
            violation.pointer.as_str()
        };
        println!("{pointer}: {}", violation.message);
    }
    eprintln!(
        "{}: {} schema violation(s)",
        data_path.display(),
        violations.len()
    );
    Ok(EXIT_NO_ANSWER)
}

fn no_answer(err: portfolio::QueryError) -> Result<i32> {
    eprintln!("{err}");
    Ok(EXIT_NO_ANSWER)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("writing JSON to stdout")?;
    writeln!(out)?;
    Ok(())
}

enum Command {
    Query(QueryCommand),
    Validate,
}

enum QueryCommand {
    Count,
    Get(ProjectId),
    Techniques,
    Stats(Option<String>),
    Search(SearchQuery),
}

struct Cli {
    data: Option<PathBuf>,
    command: Command,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut data: Option<PathBuf> = None;

        let command_name = loop {
            let Some(arg) = next_arg(&mut args)? else {
                print_usage();
                bail!("missing command");
            };
            match arg.as_str() {
                "--data" => data = Some(PathBuf::from(next_value(&mut args, "--data")?)),
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
                _ => break arg,
            }
        };

        let command = match command_name.as_str() {
            "count" => {
                expect_end(&mut args)?;
                Command::Query(QueryCommand::Count)
            }
            "get" => {
                let raw = next_value(&mut args, "get")?;
                let id: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("project id must be an integer, got '{raw}'"))?;
                expect_end(&mut args)?;
                Command::Query(QueryCommand::Get(ProjectId(id)))
            }
            "techniques" => {
                expect_end(&mut args)?;
                Command::Query(QueryCommand::Techniques)
            }
            "stats" => {
                let technique = next_arg(&mut args)?;
                expect_end(&mut args)?;
                Command::Query(QueryCommand::Stats(technique))
            }
            "search" => Command::Query(QueryCommand::Search(parse_search(&mut args)?)),
            "validate" => {
                expect_end(&mut args)?;
                Command::Validate
            }
            other => bail!("unknown command: {other}"),
        };

        Ok(Self { data, command })
    }
}

const FIELDS_CONFLICT: &str = "--no-fields cannot be combined with --field/--fields";

fn parse_search(args: &mut impl Iterator<Item = OsString>) -> Result<SearchQuery> {
    let mut query = SearchQuery::new();
    let mut techniques: Vec<String> = Vec::new();
    let mut fields: Option<Vec<String>> = None;
    let mut no_fields = false;
    let mut sanitize = false;

    while let Some(arg) = next_arg(args)? {
        match arg.as_str() {
            "--sort-by" => query.sort_by = next_value(args, "--sort-by")?,
            "--order" => query.sort_order = next_value(args, "--order")?,
            "--technique" => techniques.push(next_value(args, "--technique")?),
            "--techniques" => techniques.extend(split_list(&next_value(args, "--techniques")?)),
            "--search" => query.search = Some(next_value(args, "--search")?),
            "--field" | "--fields" if no_fields => bail!(FIELDS_CONFLICT),
            "--field" => fields
                .get_or_insert_with(Vec::new)
                .push(next_value(args, "--field")?),
            "--fields" => fields
                .get_or_insert_with(Vec::new)
                .extend(split_list(&next_value(args, "--fields")?)),
            "--no-fields" if fields.is_some() => bail!(FIELDS_CONFLICT),
            "--no-fields" => no_fields = true,
            "--sanitize" => sanitize = true,
            other => bail!("unknown search flag: {other}"),
        }
    }

    if sanitize {
        query.search = query.search.map(|term| sanitize_search_term(&term));
    }
    if !techniques.is_empty() {
        query.techniques = Some(techniques);
    }
    query.search_fields = if no_fields { Some(Vec::new()) } else { fields };
    Ok(query)
}

fn next_arg(args: &mut impl Iterator<Item = OsString>) -> Result<Option<String>> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))
        })
        .transpose()
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn expect_end(args: &mut impl Iterator<Item = OsString>) -> Result<()> {
    match next_arg(args)? {
        Some(extra) => bail!("unexpected argument: {extra}"),
        None => Ok(()),
    }
}

fn usage() -> &'static str {
    "Usage: portfolio [--data PATH] <command>\n\
Commands:\n\
  count                      number of projects\n\
  get ID                     project with project_no ID\n\
  techniques                 sorted list of distinct techniques\n\
  stats [TECHNIQUE]          projects per technique, sorted by name\n\
  search [--sort-by FIELD] [--order asc|desc] [--technique T]... [--techniques LIST]\n\
         [--search TEXT] [--field F]... [--fields LIST] [--no-fields] [--sanitize]\n\
  validate                   check the data file against the project schema\n\
The data file defaults to $PORTFOLIO_DATA, then the nearest data.json upwards from the working directory.\n"
}

fn print_usage() {
    eprint!("{}", usage());
}
