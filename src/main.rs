use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xml2table::convert::{self, ConvertOptions};
use xml2table::io::{Delimiter, OutputFormat};
use xml2table::progress::TracingObserver;
use xml2table::{Result, ToolError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => execute_convert(args),
    }
}

fn execute_convert(args: ConvertArgs) -> Result<()> {
    let json = args.json;
    let input = args.input.clone();
    let options = args.into_options();

    let summary = convert::convert_file(&input, &options, &TracingObserver)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flatten XML documents into CSV and Excel tables."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an XML document into one or more tables.
    Convert(ConvertArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input XML file path.
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving the output files. Defaults to the input's directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Element tag delimiting one row. Inferred from the root's first child when omitted.
    #[arg(long)]
    record_tag: Option<String>,

    /// CSV field delimiter: comma, semicolon, tab, pipe, or the literal character.
    #[arg(long, default_value = "comma", value_parser = parse_delimiter)]
    delimiter: Delimiter,

    /// Output formats to write. Defaults to both CSV and Excel.
    #[arg(long = "format", value_enum)]
    formats: Vec<OutputFormat>,

    /// Print the conversion summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn parse_delimiter(value: &str) -> std::result::Result<Delimiter, String> {
    value.parse().map_err(|err: ToolError| err.to_string())
}

impl ConvertArgs {
    fn into_options(self) -> ConvertOptions {
        let defaults = ConvertOptions::default();
        ConvertOptions {
            record_tag: self.record_tag,
            delimiter: self.delimiter,
            formats: if self.formats.is_empty() {
                defaults.formats
            } else {
                self.formats
            },
            output_dir: self.output_dir,
        }
    }
}
