//! PDF Toolbox CLI tool
//!
//! A command-line front end for the batch PDF operations in `pdf_toolbox`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use pdf_toolbox::naming::DEFAULT_MERGED_FILE;
use pdf_toolbox::pdf::{self, DEFAULT_ROTATION};
use pdf_toolbox::{about, raster};

/// PDF Toolbox - Batch operations on PDF files and images
#[derive(Parser)]
#[command(name = "pdf-toolbox")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Pages 2 to 5 into report_from_2_to_5.pdf
    pdf-toolbox extract report.pdf 2 5

    # Merge numbered PDFs in order
    pdf-toolbox merge -o handout.pdf \"[0-9]*.pdf\"

    # Encrypt, then decrypt again
    pdf-toolbox encrypt report.pdf secret
    pdf-toolbox decrypt report_encrypted.pdf secret

    # Show the underlying error when something fails
    pdf-toolbox --debug watermark report.pdf logo.png")]
struct Cli {
    /// Print the full error chain after the error message
    #[arg(long, global = true)]
    debug: bool,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a PDF is encrypted
    Encrypted {
        input: PathBuf,
    },

    /// Encrypt a PDF with AES-256 into {stem}_encrypted.pdf
    Encrypt {
        input: PathBuf,
        password: String,
    },

    /// Decrypt a PDF into {stem}_uncrypted.pdf
    Decrypt {
        input: PathBuf,
        password: String,
    },

    /// Show document metadata
    Metadata {
        input: PathBuf,
    },

    /// Show the page count
    Pages {
        input: PathBuf,
    },

    /// Show the outline (table of contents)
    Toc {
        input: PathBuf,
    },

    /// Print the text of every page
    Text {
        input: PathBuf,
    },

    /// Copy a page range into {stem}_from_{start}_to_{stop}.pdf
    Extract {
        input: PathBuf,

        /// First page (1-indexed)
        #[arg(default_value_t = 1)]
        start: u32,

        /// Last page (inclusive)
        #[arg(default_value_t = 1)]
        stop: u32,
    },

    /// Copy the last page into {stem}_last_page.pdf
    LastPage {
        input: PathBuf,
    },

    /// Write every page to {stem}_{n}.pdf
    Split {
        input: PathBuf,
    },

    /// Copy a page range rotated into {stem}_{start}_{stop}_{rotation}.pdf
    Rotate {
        input: PathBuf,

        #[arg(default_value_t = 1)]
        start: u32,

        #[arg(default_value_t = 1)]
        stop: u32,

        /// Degrees to add to each page's rotation
        #[arg(default_value_t = DEFAULT_ROTATION, allow_hyphen_values = true)]
        rotation: i64,
    },

    /// Render a page range to {stem}_{page}.jpg at 72 dpi
    ToImages {
        input: PathBuf,

        #[arg(default_value_t = 1)]
        start: u32,

        #[arg(default_value_t = 1)]
        stop: u32,
    },

    /// Wrap an image in a single-page PDF
    FromImage {
        input: PathBuf,
    },

    /// List every PDF below a folder
    Collect {
        folder: PathBuf,
    },

    /// Merge PDF files into one. Supports glob patterns like "*.pdf"
    Merge {
        /// Input PDF files (in order)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long, default_value = DEFAULT_MERGED_FILE)]
        output: PathBuf,
    },

    /// Merge every PDF below a folder
    MergeFolder {
        folder: PathBuf,

        /// Output PDF file path
        #[arg(short, long, default_value = DEFAULT_MERGED_FILE)]
        output: PathBuf,
    },

    /// Stamp an image under every page into {stem}_watermarked.pdf
    Watermark {
        input: PathBuf,
        image: PathBuf,
    },

    /// Save every embedded image as {object}.png
    Images {
        input: PathBuf,

        /// Directory for the extracted images
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show library information
    About,
}

/// The one-line messages printed when a command fails
#[derive(Debug, Clone, Copy)]
enum Failure {
    LoadPdf,
    Arguments,
    LoadImage,
}

impl Failure {
    fn message(self) -> &'static str {
        match self {
            Failure::LoadPdf => "ERROR: Unable to load pdf file",
            Failure::Arguments => "ERROR: pls check your arguments",
            Failure::LoadImage => "ERROR: Unable to load image file",
        }
    }
}

impl Commands {
    fn failure(&self) -> Failure {
        match self {
            Commands::Extract { .. }
            | Commands::LastPage { .. }
            | Commands::Rotate { .. }
            | Commands::Collect { .. }
            | Commands::Merge { .. }
            | Commands::MergeFolder { .. } => Failure::Arguments,
            Commands::ToImages { .. } | Commands::FromImage { .. } => Failure::LoadImage,
            _ => Failure::LoadPdf,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let failure = cli.command.failure();

    let result = match cli.command {
        Commands::Encrypted { input } => cmd_encrypted(&input),
        Commands::Encrypt { input, password } => cmd_encrypt(&input, &password),
        Commands::Decrypt { input, password } => cmd_decrypt(&input, &password),
        Commands::Metadata { input } => cmd_metadata(&input),
        Commands::Pages { input } => cmd_pages(&input),
        Commands::Toc { input } => cmd_toc(&input),
        Commands::Text { input } => cmd_text(&input),
        Commands::Extract { input, start, stop } => {
            report(pdf::extract_range(&input, start, stop))
        }
        Commands::LastPage { input } => report(pdf::extract_last_page(&input)),
        Commands::Split { input } => cmd_split(&input),
        Commands::Rotate { input, start, stop, rotation } => {
            report(pdf::rotate_range(&input, start, stop, rotation))
        }
        Commands::ToImages { input, start, stop } => cmd_to_images(&input, start, stop),
        Commands::FromImage { input } => report(raster::image_to_pdf(&input)),
        Commands::Collect { folder } => cmd_collect(&folder),
        Commands::Merge { inputs, output } => cmd_merge(inputs, &output),
        Commands::MergeFolder { folder, output } => cmd_merge_folder(&folder, &output),
        Commands::Watermark { input, image } => report(pdf::watermark(&input, &image)),
        Commands::Images { input, output_dir } => cmd_images(&input, &output_dir),
        Commands::About => {
            println!("{}", about::banner());
            Ok(())
        }
    };

    if let Err(e) = result {
        println!("{}", failure.message());
        if cli.debug {
            println!("{:?}", e);
        }
        process::exit(1);
    }
}

/// Print the path a single-output operation wrote
fn report(result: pdf_toolbox::Result<PathBuf>) -> Result<()> {
    let output = result?;
    println!("{}", output.display());
    Ok(())
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => tracing::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            // Sort each pattern's matches; explicit arguments keep their order
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

fn cmd_encrypted(input: &Path) -> Result<()> {
    let encrypted = pdf::is_encrypted(input)?;
    println!("{}", encrypted);
    Ok(())
}

fn cmd_encrypt(input: &Path, password: &str) -> Result<()> {
    match pdf::encrypt(input, password)? {
        Some(output) => println!("{}", output.display()),
        None => eprintln!("{} is already encrypted", input.display()),
    }
    Ok(())
}

fn cmd_decrypt(input: &Path, password: &str) -> Result<()> {
    match pdf::decrypt(input, password)? {
        Some(output) => println!("{}", output.display()),
        None => eprintln!("{} is not encrypted", input.display()),
    }
    Ok(())
}

fn cmd_metadata(input: &Path) -> Result<()> {
    let metadata = pdf::metadata(input)?;
    for (key, value) in metadata.entries() {
        println!("{}: {}", key, value);
    }
    Ok(())
}

fn cmd_pages(input: &Path) -> Result<()> {
    let count = pdf::page_count(input)?;
    println!("{}", count);
    Ok(())
}

fn cmd_toc(input: &Path) -> Result<()> {
    let toc = pdf::table_of_contents(input)?;
    for entry in toc {
        let indent = "  ".repeat(entry.level.saturating_sub(1));
        println!("{}{} ... {}", indent, entry.title, entry.page);
    }
    Ok(())
}

fn cmd_text(input: &Path) -> Result<()> {
    let text = pdf::extract_text(input)?;
    println!("{}", text);
    Ok(())
}

fn cmd_split(input: &Path) -> Result<()> {
    let outputs = pdf::split_into_single_pages(input)?;
    for output in outputs {
        println!("{}", output.display());
    }
    Ok(())
}

fn cmd_to_images(input: &Path, start: u32, stop: u32) -> Result<()> {
    let outputs = raster::pdf_to_images(input, start, stop)?;
    for output in outputs {
        println!("{}", output.display());
    }
    Ok(())
}

fn cmd_collect(folder: &Path) -> Result<()> {
    let paths = pdf::collect_pdf_paths(folder)?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, output: &Path) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    eprintln!("Merging {} PDF files...", inputs.len());
    pdf::merge_list(&inputs, output)
        .with_context(|| format!("merging into {}", output.display()))?;
    println!("{}", output.display());

    Ok(())
}

fn cmd_merge_folder(folder: &Path, output: &Path) -> Result<()> {
    pdf::merge_folder(folder, output)
        .with_context(|| format!("merging {} into {}", folder.display(), output.display()))?;
    println!("{}", output.display());
    Ok(())
}

fn cmd_images(input: &Path, output_dir: &Path) -> Result<()> {
    let images = pdf::extract_images_to(input, output_dir)?;
    for image in images {
        println!("Width: {}, Height: {}, Name: {}", image.width, image.height, image.name);
    }
    Ok(())
}
