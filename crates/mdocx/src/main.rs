#![doc = include_str!("../README.md")]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mdocx::headings::{self, NumberingScheme};
use mdocx::{ConvertFeat, Error, Format, Mdocx, Result};

/// Markdown to Word converter and heading utilities.
#[derive(Debug, Parser)]
#[command(name = "mdocx", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a Markdown file to DOCX, HTML or plain text.
    Convert {
        /// Path to the input Markdown file
        input: PathBuf,

        /// Path to the output file; derived from the input when omitted.
        /// The extension picks the format (.docx, .html, .txt).
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Template document supplying named styles and page geometry
        #[arg(long, value_name = "TEMPLATE")]
        template: Option<PathBuf>,
    },
    /// Rewrite Markdown heading levels or numbering.
    Headings {
        /// Path to the input Markdown file
        input: PathBuf,

        /// The rewrite to perform
        #[arg(value_enum)]
        action: HeadingAction,

        /// Output path; defaults to rewriting the input file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Numbering scheme for add-numbers
        #[arg(long, value_enum, default_value_t = NumberingScheme::Tech)]
        style: NumberingScheme,

        /// JSON file with custom per-level numbering templates
        #[arg(long, value_name = "JSON")]
        numbering_template: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeadingAction {
    /// h2 becomes h1, h3 becomes h2, and so on; h1 stays h1
    Upgrade,
    /// h1 becomes h2, h2 becomes h3, and so on; h6 stays h6
    Downgrade,
    /// Strip recognized numbering prefixes from headings
    RemoveNumbers,
    /// Add structured numbering to headings
    AddNumbers,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Convert {
            input,
            output,
            template,
        } => convert(input, output, template),
        Command::Headings {
            input,
            action,
            output,
            style,
            numbering_template,
        } => rewrite_headings(input, action, output, style, numbering_template),
    }
}

fn convert(input: PathBuf, output: Option<PathBuf>, template: Option<PathBuf>) -> Result<()> {
    let format = match output
        .as_deref()
        .and_then(|path| path.extension())
        .and_then(std::ffi::OsStr::to_str)
    {
        Some("html" | "htm") => Format::Html,
        Some("txt") => Format::Text,
        _ => Format::Docx,
    };

    let written = Mdocx::new(input)
        .with_feature(ConvertFeat { template })
        .with_format(format)
        .convert_to_file(output)?;
    println!("saved to {}", written.display());
    Ok(())
}

fn rewrite_headings(
    input: PathBuf,
    action: HeadingAction,
    output: Option<PathBuf>,
    style: NumberingScheme,
    numbering_template: Option<PathBuf>,
) -> Result<()> {
    let content = std::fs::read_to_string(&input).map_err(|e| Error::io(&input, e))?;

    let rewritten = match action {
        HeadingAction::Upgrade => headings::upgrade(&content),
        HeadingAction::Downgrade => headings::downgrade(&content),
        HeadingAction::RemoveNumbers => headings::strip_numbering(&content),
        HeadingAction::AddNumbers => match numbering_template {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                let templates = headings::templates_from_json(&json)?;
                headings::add_numbering_with(&content, &templates)
            }
            None => headings::add_numbering(&content, style),
        },
    };

    let target = output.unwrap_or(input);
    std::fs::write(&target, rewritten).map_err(|e| Error::io(&target, e))?;
    println!("saved to {}", target.display());
    Ok(())
}
