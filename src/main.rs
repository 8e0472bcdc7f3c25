use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Serialize;
use serde_json::json;

use wikiscan::wikitext::{
    Layout, SpanKind, WikiText, WtError,
    errors::Result,
    scanner::strip_comments,
    types::templates::{build, parse_arguments},
};

#[derive(Parser)]
#[command(name = "wikiscan")]
#[command(author, version, about = "Find templates, tables and links in wikitext")]
struct Cli {
    /// Wikitext file to read, `-` for stdin
    #[arg(long, short = 'i', global = true, default_value = "-")]
    input: PathBuf,

    /// Drop `<!-- -->` comments before processing
    #[arg(long, global = true)]
    strip_comments: bool,

    /// Print compact JSON instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every structural span
    Spans {
        /// Only spans of this kind (template, wikilink, comment, ...)
        #[arg(long, short = 'k')]
        kind: Option<SpanKind>,
    },

    /// Extract invocations of a template
    Templates {
        /// Template name (case-sensitive)
        name: String,

        /// Print parsed arguments instead of raw invocations
        #[arg(long)]
        args: bool,

        /// Drop non-numeric named arguments
        #[arg(long)]
        ignore_named: bool,

        /// Only the first invocation; fails if absent or unclosed
        #[arg(long)]
        first: bool,

        /// Re-render each invocation with this layout (compact, multiline)
        #[arg(long)]
        layout: Option<Layout>,
    },

    /// Parse every top-level table
    Tables,

    /// List internal and external links
    Links,

    /// Print the redirect target, if the page is a redirect
    Redirect,
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| WtError::io_err("failed to read stdin", e))?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|e| WtError::io_err(format!("failed to read {:?}", path), e))
}

fn print<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}

fn templates(
    page: &WikiText,
    name: &str,
    args: bool,
    ignore_named: bool,
    first: bool,
    layout: Option<Layout>,
    compact: bool,
) -> Result<()> {
    let found = if first {
        vec![page.template(name)?]
    } else {
        page.templates(name)
    };
    log::info!("[templates] {} invocation(s) of {:?}", found.len(), name);

    if let Some(layout) = layout {
        let rendered: Vec<String> = found
            .iter()
            .map(|t| build(&parse_arguments(t, ignore_named), name, layout))
            .collect();
        return print(&rendered, compact);
    }
    if args {
        let parsed: Vec<_> = found
            .iter()
            .map(|t| parse_arguments(t, ignore_named))
            .collect();
        return print(&parsed, compact);
    }
    print(&found, compact)
}

fn run(cli: Cli) -> Result<()> {
    let mut text = read_input(&cli.input)?;
    if cli.strip_comments {
        text = strip_comments(&text);
    }
    let mut page = WikiText::new(text);
    if cli.input.as_os_str() != "-" {
        page.set_page_name(cli.input.file_stem().map(|s| s.to_string_lossy()));
    }
    log::debug!("loaded {:?} ({} bytes)", page.page_name(), page.text().len());

    match cli.command {
        Commands::Spans { kind } => match kind {
            Some(kind) => print(&page.spans_of_kind(kind).collect::<Vec<_>>(), cli.compact),
            None => print(&page.spans(), cli.compact),
        },
        Commands::Templates {
            name,
            args,
            ignore_named,
            first,
            layout,
        } => templates(&page, &name, args, ignore_named, first, layout, cli.compact),
        Commands::Tables => print(&page.tables(), cli.compact),
        Commands::Links => print(
            &json!({
                "internal": page.inner_links(),
                "external": page.external_links(),
            }),
            cli.compact,
        ),
        Commands::Redirect => print(&page.redirect(), cli.compact),
    }
}

fn main() {
    dotenv().ok();
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{} ({})", e, e.kind());
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
