//! Compile a grammar file into `<module>.rs` and `<module>.schema.json`.
use anyhow::{Context, Result};
use clap::Parser;
use datamodel_gen::{Generator, Options};
use std::path::PathBuf;

/// Generate a typed object model from an annotated EBNF grammar
#[derive(Parser, Debug)]
#[command(name = "datamodel-gen", version)]
struct CommandLineInterface {
    /// grammar file to compile
    grammar: PathBuf,

    /// output directory (current directory if omitted)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// add offset/length members to every concrete node type
    #[arg(long, default_value_t = false)]
    generate_locations: bool,

    /// log pipeline progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = CommandLineInterface::parse();
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let file_name = cli
        .grammar
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' is not a grammar file", cli.grammar.display()))?;
    let base_dir = cli
        .grammar
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let options = Options::new()
        .generate_locations(cli.generate_locations)
        .verbose(cli.verbose);
    let files = Generator::new(&base_dir)
        .with_options(options)
        .generate(file_name)
        .with_context(|| format!("failed to compile '{}'", cli.grammar.display()))?;
    let written = files
        .write_to(&cli.output)
        .with_context(|| format!("failed to write into '{}'", cli.output.display()))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
