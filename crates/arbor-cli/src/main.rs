//! `arbor` - render hast JSON trees to HTML.
//!
//! ```text
//! arbor page.json --rules rules.yaml --components components/ --prop lang=en
//! ```

mod input;
mod rules;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use arbor_dispatch::Pipeline;
use arbor_render::Host;
use clap::Parser;
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::input::Section;

#[derive(Debug, Parser)]
#[command(name = "arbor", version, about = "Render hast JSON trees to HTML")]
struct Cli {
    /// JSON document to render (`-` reads stdin)
    input: PathBuf,

    /// YAML rule file deciding which component renders which node
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Directory of component templates (.jinja, .jinja2, .j2, .html)
    #[arg(short, long)]
    components: Option<PathBuf>,

    /// Ambient prop visible to every component, as key=value. Repeatable.
    ///
    /// Values that parse as JSON (numbers, booleans, arrays) keep their type.
    #[arg(short, long = "prop", value_name = "KEY=VALUE", value_parser = parse_prop)]
    props: Vec<(String, Value)>,

    /// Render the document's table of contents instead of its content
    #[arg(long)]
    toc: bool,

    /// Write the HTML to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv). ARBOR_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_prop(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let section = if cli.toc { Section::Toc } else { Section::Content };
    let nodes = input::load(&cli.input, section)?;

    let mut host = Host::new()?;
    if let Some(dir) = &cli.components {
        host.set_component_dir(dir)
            .with_context(|| format!("could not use components from {}", dir.display()))?;
    }

    let rules = match &cli.rules {
        Some(path) => rules::load(path)?,
        None => Vec::new(),
    };
    for (index, rule) in rules.iter().enumerate() {
        if let Some(name) = rule.component() {
            if !host.has_component(name) {
                bail!("rule #{index} uses component `{name}`, which was not found");
            }
        }
    }
    let pipeline: Arc<Pipeline> = Arc::new(rules::pipeline(rules));
    debug!(hooks = pipeline.len(), nodes = nodes.len(), "pipeline ready");

    let props: Map<String, Value> = cli.props.iter().cloned().collect();
    let html = host.render_with_props(&nodes, &pipeline, &props)?;
    info!(bytes = html.len(), "rendered");
    Ok(html)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let html = run(&cli)?;
    match &cli.output {
        Some(path) => std::fs::write(path, &html)
            .with_context(|| format!("could not write {}", path.display()))?,
        None => println!("{html}"),
    }
    Ok(())
}
