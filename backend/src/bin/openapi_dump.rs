//! Print the OpenAPI document as JSON.

use std::io::{self, Write};

use clap::Parser;
use color_eyre::eyre::Result;
use orgadmin::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(about = "Print the OpenAPI document as JSON")]
struct Args {
    /// Pretty-print the document.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let doc = ApiDoc::openapi();
    let json = if args.pretty {
        doc.to_pretty_json()?
    } else {
        doc.to_json()?
    };
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(())
}
