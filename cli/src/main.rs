//! undoc CLI - document content extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use undoc::fetch::{check_url, filename_from_url, normalize_url, FetchPolicy, USER_AGENT};
use undoc::parser::DEFAULT_IMAGE_DIR;
use undoc::{
    enrich, DocumentFormat, DocumentParser, JsonFormat, OfflineDescriber, ParseOptions,
    ParsedDocument,
};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "undoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Extract text, tables and images from PDF, DOCX, PPTX, TXT, HTML and CSV",
    long_about = None
)]
struct Cli {
    /// Input document
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print it as JSON
    Parse {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Attach a description to every extracted image
        #[arg(long)]
        describe: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Print the extracted text
    Text {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the recovered tables
    Tables {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Cell separator
        #[arg(short, long, default_value = "\t")]
        separator: String,

        /// Skip heuristic table detection (native tables only)
        #[arg(long)]
        no_detect: bool,
    },

    /// Show document information
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Extract validated images into a directory
    Images {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "images")]
        output: PathBuf,

        /// Keep files already in the output directory
        #[arg(long)]
        keep_images: bool,
    },

    /// Download a document from a URL and parse it
    Fetch {
        /// URL of the document; https:// is assumed when missing
        #[arg(value_name = "URL")]
        url: String,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show version information
    Version,
}

/// Image and table settings shared by the commands that produce JSON.
#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    /// Directory extracted images are written to
    #[arg(long, value_name = "DIR", default_value = DEFAULT_IMAGE_DIR)]
    image_dir: PathBuf,

    /// Keep images from earlier runs in the image directory
    #[arg(long)]
    keep_images: bool,

    /// Skip image extraction
    #[arg(long)]
    no_images: bool,

    /// Skip heuristic table detection
    #[arg(long)]
    no_tables: bool,
}

impl ExtractArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_image_dir(&self.image_dir)
            .with_images(!self.no_images)
            .with_table_detection(!self.no_tables)
    }

    /// Build a parser, clearing the image directory of a previous run.
    fn parser(&self) -> undoc::Result<DocumentParser> {
        let parser = DocumentParser::with_options(self.options());
        if !self.no_images && !self.keep_images {
            parser.reset_image_dir()?;
        }
        Ok(parser)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Parse {
            input,
            output,
            compact,
            describe,
            extract,
        }) => cmd_parse(&input, output.as_deref(), compact, describe, &extract),
        Some(Commands::Text { input, output }) => cmd_text(&input, output.as_deref()),
        Some(Commands::Tables {
            input,
            separator,
            no_detect,
        }) => cmd_tables(&input, &separator, no_detect),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Images {
            input,
            output,
            keep_images,
        }) => cmd_images(&input, &output, keep_images),
        Some(Commands::Fetch {
            url,
            output,
            compact,
            extract,
        }) => cmd_fetch(&url, output.as_deref(), compact, &extract),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: parse if input is provided
            if let Some(input) = cli.input {
                let extract = ExtractArgs {
                    image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
                    keep_images: false,
                    no_images: false,
                    no_tables: false,
                };
                cmd_parse(&input, None, false, false, &extract)
            } else {
                println!("{}", "Usage: undoc <FILE>".yellow());
                println!("       undoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn spinner(message: String) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_output(content: &str, output: Option<&Path>) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Surface recorded extraction problems without failing the command.
fn report_problems(doc: &ParsedDocument) {
    if let Some(ref error) = doc.metadata.error {
        eprintln!("{}: {}", "Warning".yellow().bold(), error);
    }
    if let Some(ref error) = doc.metadata.extraction_error {
        eprintln!("{}: {}", "Warning".yellow().bold(), error);
    }
}

fn render_json(doc: ParsedDocument, format: JsonFormat, describe: bool) -> undoc::Result<String> {
    if describe {
        enrich(doc, &OfflineDescriber::new()).to_json(format)
    } else {
        doc.to_json(format)
    }
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    describe: bool,
    extract: &ExtractArgs,
) -> CliResult {
    let parser = extract.parser()?;

    let pb = spinner(format!("Parsing {}...", input.display()))?;
    let doc = parser.parse_file(input)?;
    pb.finish_and_clear();

    report_problems(&doc);
    let json = render_json(doc, json_format(compact), describe)?;
    write_output(&json, output)
}

fn cmd_text(input: &Path, output: Option<&Path>) -> CliResult {
    let doc = DocumentParser::with_options(ParseOptions::new().text_only()).parse_file(input)?;
    report_problems(&doc);
    write_output(&doc.full_text, output)
}

fn cmd_tables(input: &Path, separator: &str, no_detect: bool) -> CliResult {
    let options = ParseOptions::new()
        .with_images(false)
        .with_table_detection(!no_detect);
    let doc = DocumentParser::with_options(options).parse_file(input)?;
    report_problems(&doc);

    if doc.tables.is_empty() {
        println!("{}", "No tables found".yellow());
        return Ok(());
    }

    for (index, table) in doc.tables.iter().enumerate() {
        println!(
            "{} {} ({} rows x {} columns)",
            "Table".cyan().bold(),
            index + 1,
            table.row_count(),
            table.column_count()
        );
        println!("{}", table.to_delimited(separator));
        println!();
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let filename = input.file_name().unwrap_or_default().to_string_lossy();
    let format = DocumentFormat::from_filename(&filename);

    // Images are counted, not kept
    let scratch = std::env::temp_dir().join(format!("undoc-info-{}", std::process::id()));
    let options = ParseOptions::new().with_image_dir(&scratch);
    let doc = DocumentParser::with_options(options).parse_file(input)?;
    if scratch.exists() {
        fs::remove_dir_all(&scratch)?;
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    match format {
        Some(format) => println!("{}: {}", "Format".bold(), format),
        None => println!("{}: {}", "Format".bold(), "unsupported".red()),
    }
    println!("{}: {}", "Method".bold(), doc.metadata.extraction_method);

    let meta = &doc.metadata;
    if let Some(pages) = meta.pages {
        println!("{}: {}", "Pages".bold(), pages);
    }
    if let Some(slides) = meta.slides {
        println!("{}: {}", "Slides".bold(), slides);
    }
    if let Some(ref encoding) = meta.encoding {
        println!("{}: {}", "Encoding".bold(), encoding);
    }
    if let Some(ref delimiter) = meta.delimiter_detected {
        println!("{}: {:?}", "Delimiter".bold(), delimiter);
    }
    if let Some(ref title) = meta.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = meta.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = meta.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = meta.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = meta.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = meta.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), doc.word_count());
    println!("{}: {}", "Characters".bold(), doc.full_text.chars().count());
    println!("{}: {}", "Tables".bold(), meta.tables_found);
    println!("{}: {}", "Images".bold(), meta.images_found);
    if let Some(rows) = meta.rows_parsed {
        println!("{}: {}", "Rows".bold(), rows);
    }

    if let Some(ref error) = meta.extraction_error {
        println!();
        println!("{}: {}", "Problems".yellow().bold(), error);
    }

    Ok(())
}

fn cmd_images(input: &Path, output: &Path, keep_images: bool) -> CliResult {
    let options = ParseOptions::new()
        .with_image_dir(output)
        .with_table_detection(false);
    let parser = DocumentParser::with_options(options);
    if !keep_images {
        parser.reset_image_dir()?;
    }

    let doc = parser.parse_file(input)?;
    report_problems(&doc);

    for path in &doc.image_files {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("{} {}", "Extracted".green(), name);
    }

    println!(
        "\n{} {} images extracted to {}",
        "Done!".green().bold(),
        doc.image_files.len(),
        output.display()
    );

    Ok(())
}

fn cmd_fetch(url: &str, output: Option<&Path>, compact: bool, extract: &ExtractArgs) -> CliResult {
    let url = check_url(&normalize_url(url))?;
    let policy = FetchPolicy::default();

    let pb = spinner(format!("Fetching {}...", url))?;
    let rt = tokio::runtime::Runtime::new()?;
    let data = rt.block_on(download(url.clone(), &policy));
    pb.finish_and_clear();
    let data = data?;

    let filename = filename_from_url(&url);
    log::info!("fetched {} bytes from {} as {}", data.len(), url, filename);

    let doc = extract.parser()?.parse(&data, &filename);
    report_problems(&doc);
    write_output(&doc.to_json(json_format(compact))?, output)
}

async fn download(url: reqwest::Url, policy: &FetchPolicy) -> CliResult<Vec<u8>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(policy.timeout_secs))
        .build()?;

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("{} returned HTTP {}", url, status).into());
    }
    if let Some(length) = response.content_length() {
        policy.check_size(usize::try_from(length).unwrap_or(usize::MAX))?;
    }

    let body = response.bytes().await?;
    policy.check_size(body.len())?;
    Ok(body.to_vec())
}

fn cmd_version() {
    println!("{} {}", "undoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document content extraction tool");
    println!();
    println!("Formats: {}", supported_formats().dimmed());
    println!("Repository: {}", "https://github.com/iyulab/undoc".dimmed());
    println!("License: MIT");
}

fn supported_formats() -> String {
    DocumentFormat::ALL
        .iter()
        .map(|format| format.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
