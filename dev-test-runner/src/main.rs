//! Scenario runner: compiles each fixture's documentation block and replays
//! its request/response cases, asserting success or an expected error kind.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use docjson::{Body, Endpoint, ErrorKind};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

#[derive(Parser, Debug)]
struct Settings {
    /// fixture files (glob)
    #[arg(long, default_value = "dev-test-runner/fixtures/*.json")]
    fixtures: String,

    /// only run scenarios whose name matches this regex
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    doc: String,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Case {
    Request {
        method: String,
        #[serde(default)]
        route: Map<String, Value>,
        #[serde(default, deserialize_with = "present")]
        body: Option<Value>,
        #[serde(default)]
        expect: Option<ErrorKind>,
    },
    Response {
        status: u16,
        #[serde(default, deserialize_with = "present")]
        body: Option<Value>,
        #[serde(default)]
        expect: Option<ErrorKind>,
    },
}

/// An explicit `"body": null` is a null body; only a missing key means no body.
fn present<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

impl Case {
    fn run(&self, endpoint: &Endpoint) -> (String, Option<ErrorKind>, Option<ErrorKind>) {
        match self {
            Case::Request { method, route, body, expect } => {
                let got = endpoint.validate_request(method, route, body.as_ref()).err().map(|e| e.kind());
                (format!("{method} request"), *expect, got)
            }
            Case::Response { status, body, expect } => {
                let body = body.as_ref().map_or(Body::Empty, Body::Json);
                let got = endpoint.validate_response(*status, body).err().map(|e| e.kind());
                (format!("{status} response"), *expect, got)
            }
        }
    }
}

fn load_scenarios(pattern: &str) -> Result<Vec<(PathBuf, Vec<Scenario>)>> {
    let mut out = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        let src = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let scenarios = docjson::path_de::from_str_with_path::<Vec<Scenario>>(&src)
            .with_context(|| format!("malformed fixture {}", path.display()))?;
        out.push((path, scenarios));
    }
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DOCJSON_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let settings = Settings::parse();
    let filter = settings.filter.as_deref().map(Regex::new).transpose()?;

    let mut passed = 0usize;
    let mut failed = 0usize;
    for (path, scenarios) in load_scenarios(&settings.fixtures)? {
        for scenario in scenarios {
            if filter.as_ref().is_some_and(|rx| !rx.is_match(&scenario.name)) {
                continue;
            }
            let endpoint = match Endpoint::compile(&scenario.doc) {
                Ok(Some(endpoint)) => endpoint,
                Ok(None) => {
                    failed += 1;
                    eprintln!("{} {} ({}): no schema block", "❌".red(), scenario.name, path.display());
                    continue;
                }
                Err(error) => {
                    failed += 1;
                    eprintln!("{} {} ({}): {error}", "❌".red(), scenario.name, path.display());
                    continue;
                }
            };
            for case in &scenario.cases {
                let (label, expect, got) = case.run(&endpoint);
                if expect == got {
                    passed += 1;
                    eprintln!("{} {} / {label}", "✅".green(), scenario.name);
                } else {
                    failed += 1;
                    eprintln!(
                        "{} {} / {label}: expected {expect:?}, got {got:?}",
                        "❌".red(),
                        scenario.name
                    );
                }
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed > 0 {
        bail!("{failed} scenario case(s) failed");
    }
    Ok(())
}
