//! Minimal CLI: compile documentation → (schema | check | request | response)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use crate::error::EndpointError;
use crate::http::Body;
use crate::registry::Registry;
use crate::validate::{Validator, DEFAULT_MAX_DEPTH};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile schema blocks embedded in endpoint docs and validate payloads against them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// debug logging (overridden by DOCJSON_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and print the schema tree as JSON
    Parse(ParseOut),
    /// compile every input and report mis-specified schemas
    Check(CheckArgs),
    /// validate a request against a schema
    Request(RequestArgs),
    /// validate a response against a schema
    Response(ResponseArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// inputs are bare DSL source rather than documentation with a `Schema::` block
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// documentation (or bare DSL with --raw) holding the schema
    #[arg(long, short)]
    schema: PathBuf,

    /// schema file is bare DSL source
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// nesting depth before validation gives up
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// JSON body file; omit for no body
    #[arg(long, short)]
    body: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct RequestArgs {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// HTTP method of the request
    #[arg(long, short)]
    method: String,

    /// route variable as name=value (repeatable)
    #[arg(long, short, value_parser = parse_route_arg)]
    route: Vec<(String, String)>,
}

#[derive(clap::Parser, Debug)]
struct ResponseArgs {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// HTTP status code of the response
    #[arg(long)]
    status: u16,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, String) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            apply(&source_path, wrap_raw(source, self.raw))?;
        }
        Ok(())
    }
}

impl SchemaSettings {
    fn load_endpoint(&self) -> Result<Endpoint> {
        let source = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let endpoint = Endpoint::compile(&wrap_raw(source, self.raw))
            .with_context(|| format!("schema in {} is mis-specified", self.schema.display()))?;
        let Some(endpoint) = endpoint else {
            bail!("no `Schema::` block found in {}", self.schema.display());
        };
        Ok(endpoint.with_validator(Validator::with_max_depth(self.max_depth)))
    }

    /// Bodies stay raw bytes so decoding failures surface as body failures.
    fn load_body(&self) -> Result<Option<Vec<u8>>> {
        self.body
            .as_ref()
            .map(|path| {
                std::fs::read(path).with_context(|| format!("failed to read body file {}", path.display()))
            })
            .transpose()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Parse(target) => {
                let mut compiled = Map::new();
                target.input_settings.load_process(|path, doc| {
                    let schema = crate::endpoint::compile(&doc)
                        .with_context(|| format!("schema in {} is mis-specified", path.display()))?;
                    let value = match schema {
                        Some(schema) => serde_json::to_value(&schema)?,
                        None => Value::Null,
                    };
                    compiled.insert(path.display().to_string(), value);
                    Ok(())
                })?;
                let schema_src = serde_json::to_string_pretty(&compiled)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &schema_src)?;
                } else {
                    println!("{schema_src}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let mut registry = Registry::new();
                let mut failures = 0usize;
                target.input_settings.load_process(|path, doc| {
                    let name = path.display().to_string();
                    match registry.register(name.clone(), &doc) {
                        Ok(true) => println!("{} {name}", "✅".green()),
                        Ok(false) => println!("{} {name}: no schema block", "·".dimmed()),
                        Err(error) => {
                            failures += 1;
                            println!("{} {}", "❌".red(), error);
                        }
                    }
                    Ok(())
                })?;
                if failures > 0 {
                    bail!("{failures} mis-specified schema(s)");
                }
                Ok(())
            }
            Command::Request(target) => {
                let endpoint = target.schema_settings.load_endpoint()?;
                let body = target.schema_settings.load_body()?;
                let args: Map<String, Value> = target
                    .route
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                let body = body.as_deref().map_or(Body::Empty, Body::Raw);
                report(endpoint.validate_request(&target.method, &args, body))
            }
            Command::Response(target) => {
                let endpoint = target.schema_settings.load_endpoint()?;
                let body = target.schema_settings.load_body()?;
                let body = body.as_deref().map_or(Body::Empty, Body::Raw);
                report(endpoint.validate_response(target.status, body))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(outcome: std::result::Result<(), EndpointError>) -> Result<()> {
    match outcome {
        Ok(()) => {
            println!("{} ok", "✅".green());
            Ok(())
        }
        Err(error) => {
            let inner = error.inner();
            println!("{} {}", "❌".red(), error.to_string().red());
            println!("   code:   {}", inner.code());
            println!("   reason: {}", inner.reason());
            println!("   value:  {}", inner.value);
            if !inner.path.is_empty() {
                println!("   path:   {}", inner.path);
            }
            bail!("validation failed (suggested HTTP status {})", error.suggested_status())
        }
    }
}

/// Bare DSL is wrapped in a synthetic `Schema::` block so one code path compiles both.
fn wrap_raw(source: String, raw: bool) -> String {
    if !raw {
        return source;
    }
    let mut doc = String::from("Schema::\n");
    for line in source.lines() {
        doc.push_str("    ");
        doc.push_str(line);
        doc.push('\n');
    }
    doc
}

fn parse_route_arg(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {s:?}"))?;
    Ok((name.to_string(), value.to_string()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
