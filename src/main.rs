use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};

use depspec::output::{self, OutputArgs};
use depspec::DependencyParser;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One normalized requirement per line
    Text,
    /// One JSON object per line
    Json,
}

/// Parse Python dependency specifications and print what they mean.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory that relative paths are resolved against [default: current
    /// directory]
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    #[arg(long, default_value_t = Format::Text, value_enum)]
    format: Format,

    /// Dependency specifications, e.g. 'requests[socks]>=2; python_version >= "3.8"'
    #[arg(required = true, value_name = "SPEC")]
    specs: Vec<String>,

    #[command(flatten)]
    output_args: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    output::init(&cli.output_args)?;

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().wrap_err("can't find the current directory")?,
    };
    let parser = DependencyParser::new(base_dir);

    for spec in &cli.specs {
        let dep = parser.parse(spec)?;
        match cli.format {
            Format::Text => println!("{}", dep),
            Format::Json => println!("{}", serde_json::to_string(&dep)?),
        }
    }
    Ok(())
}
