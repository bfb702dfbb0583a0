// ABOUTME: CLI binary for pluck: scrape article text or images from a URL, or pull images out of documents.
// ABOUTME: Saves results into the conventional folders, prints status lines and keeps an operation log.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pluck_extract::{
    save_artifacts, save_text, Client, DocumentFormat, ExtractionRequest, ExtractionResult,
    OperationLog, ARTICLE_FILE, DOCUMENT_IMAGES_DIR, WEB_IMAGES_DIR,
};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "pluck")]
#[command(about = "Extract article text and images from web pages, PPTX, DOCX and PDF files")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print a JSON report instead of status lines
    #[arg(long = "json", global = true)]
    json_output: bool,

    /// Request timeout in seconds
    #[arg(long = "timeout", global = true, default_value_t = 30)]
    timeout: u64,

    /// Override the browser User-Agent sent with every request
    #[arg(long = "user-agent", global = true)]
    user_agent: Option<String>,

    /// Log extraction details to stderr (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Print the operation log to stderr before exiting
    #[arg(long = "show-log", global = true)]
    show_log: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the readable text of a web page
    Article {
        url: String,

        /// Also write the text to scraped_article.txt
        #[arg(long = "save")]
        save: bool,

        /// Write the text to this file (implies --save)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Download every image referenced by a web page
    Images {
        url: String,

        #[arg(long = "output-dir", default_value = WEB_IMAGES_DIR)]
        output_dir: PathBuf,
    },
    /// Extract embedded images from .pptx, .docx or .pdf files.
    /// With several files, each one's images go to OUTPUT_DIR/<file stem>/
    Document {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long = "output-dir", default_value = DOCUMENT_IMAGES_DIR)]
        output_dir: PathBuf,
    },
}

/// JSON report for one URL or file.
#[derive(Serialize, Debug)]
struct Report {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    saved: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Report {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            result: None,
            saved: Vec::new(),
            error: None,
        }
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "pluck=debug,pluck_extract=debug,warn" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut builder = Client::builder().timeout(Duration::from_secs(args.timeout));
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua);
    }
    let client = match builder.build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut log = OperationLog::new();
    let reports = match &args.command {
        Command::Article { url, save, output } => {
            let target = match (output, save) {
                (Some(path), _) => Some(path.clone()),
                (None, true) => Some(PathBuf::from(ARTICLE_FILE)),
                (None, false) => None,
            };
            vec![run_article(&client, url, target.as_deref(), args.json_output, &mut log).await]
        }
        Command::Images { url, output_dir } => {
            vec![run_images(&client, url, output_dir, args.json_output, &mut log).await]
        }
        Command::Document { files, output_dir } => {
            // Several inputs each get a subfolder named by file stem.
            let per_file_dirs = files.len() > 1;
            let mut written = HashSet::new();
            let mut reports = Vec::with_capacity(files.len());
            for file in files {
                let dir = if per_file_dirs {
                    output_dir.join(file_stem(file))
                } else {
                    output_dir.clone()
                };
                let report =
                    run_document(&client, file, &dir, &mut written, args.json_output, &mut log).await;
                reports.push(report);
            }
            reports
        }
    };

    if args.json_output {
        let rendered = if reports.len() == 1 {
            serde_json::to_string_pretty(&reports[0])
        } else {
            serde_json::to_string_pretty(&reports)
        };
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("error: cannot render JSON report: {}", e),
        }
    }

    if args.show_log && !log.is_empty() {
        eprintln!("{}", log.render());
    }

    if reports.iter().any(Report::failed) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_article(
    client: &Client,
    url: &str,
    save_to: Option<&Path>,
    json_output: bool,
    log: &mut OperationLog,
) -> Report {
    let mut report = Report::new(url);
    let result = match client.scrape_article(url).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error scraping {}: {}", url, e);
            log.error(format!("Article scrape failed for {}: {}", url, e.reason()));
            report.error = Some(e.to_string());
            return report;
        }
    };

    log.info(format!("Scraped article from URL: {}", url));
    let text = result.text.clone().unwrap_or_default();
    if result.is_empty() {
        log.error(format!("No article text found at {}.", url));
        if !json_output {
            eprintln!("No article text found at {}.", url);
        }
    } else if !json_output {
        println!("{}", text);
    }

    if let Some(path) = save_to {
        match save_text(path, &text) {
            Ok(()) => {
                log.info(format!("Saved article text to '{}'.", path.display()));
                report.saved.push(path.to_path_buf());
            }
            Err(e) => {
                eprintln!("error writing {}: {}", path.display(), e);
                log.error(format!("Could not save article text to '{}': {}", path.display(), e));
                report.error = Some(e.to_string());
            }
        }
    }

    report.result = Some(result);
    report
}

async fn run_images(
    client: &Client,
    url: &str,
    output_dir: &Path,
    json_output: bool,
    log: &mut OperationLog,
) -> Report {
    let mut report = Report::new(url);
    let result = match client.scrape_images(url).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error scraping {}: {}", url, e);
            log.error(format!("Image scrape failed for {}: {}", url, e.reason()));
            report.error = Some(e.to_string());
            return report;
        }
    };

    for failure in &result.failures {
        log.error(format!("Failed to download image {}: {}", failure.item, failure.reason));
    }

    match save_artifacts(output_dir, &result.artifacts) {
        Ok(paths) => {
            let msg = format!(
                "Scraped {} images from {} into '{}'.",
                result.count,
                url,
                output_dir.display()
            );
            if !json_output {
                println!("{}", msg);
            }
            log.info(msg);
            report.saved = paths;
        }
        Err(e) => {
            eprintln!("error writing images to {}: {}", output_dir.display(), e);
            log.error(format!("Could not save images to '{}': {}", output_dir.display(), e));
            report.error = Some(e.to_string());
        }
    }

    report.result = Some(result);
    report
}

/// Subfolder name for one of several document inputs.
fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| "document".to_string())
}

async fn run_document(
    client: &Client,
    file: &Path,
    output_dir: &Path,
    written: &mut HashSet<PathBuf>,
    json_output: bool,
    log: &mut OperationLog,
) -> Report {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let mut report = Report::new(file.display().to_string());

    let format = match DocumentFormat::from_path(file) {
        Ok(format) => format,
        Err(e) => {
            eprintln!("error: {}", e);
            log.error(format!("Unsupported file type: {}", name));
            report.error = Some(e.to_string());
            return report;
        }
    };

    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error reading {}: {}", file.display(), e);
            log.error(format!("Could not read {}: {}", name, e));
            report.error = Some(e.to_string());
            return report;
        }
    };
    log.info(format!("File uploaded: {}", name));

    let request = ExtractionRequest::document(bytes, format).with_name(name.clone());
    let result = match client.extract(&request).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error extracting {}: {}", name, e);
            log.error(format!("Extraction failed for {}: {}", name, e.reason()));
            report.error = Some(e.to_string());
            return report;
        }
    };

    for failure in &result.failures {
        log.error(format!("Skipped {} in {}: {}", failure.item, name, failure.reason));
    }

    if result.is_empty() {
        let msg = format!("No images found in {}.", name);
        if !json_output {
            println!("{}", msg);
        }
        log.error(format!("No images found in file: {}.", name));
        report.result = Some(result);
        return report;
    }

    if let Some(clash) = result
        .artifacts
        .iter()
        .map(|a| output_dir.join(&a.filename))
        .find(|path| written.contains(path))
    {
        let msg = format!(
            "refusing to overwrite '{}' written earlier for another file",
            clash.display()
        );
        eprintln!("error saving images from {}: {}", name, msg);
        log.error(format!("Could not save images from {}: {}", name, msg));
        report.error = Some(msg);
        report.result = Some(result);
        return report;
    }

    match save_artifacts(output_dir, &result.artifacts) {
        Ok(paths) => {
            written.extend(paths.iter().cloned());
            let msg = format!(
                "Extraction complete. Saved {} images in '{}'.",
                result.count,
                output_dir.display()
            );
            if !json_output {
                println!("{}", msg);
            }
            log.info(format!("Extracted {} images from {}.", result.count, name));
            report.saved = paths;
        }
        Err(e) => {
            eprintln!("error writing images to {}: {}", output_dir.display(), e);
            log.error(format!("Could not save images to '{}': {}", output_dir.display(), e));
            report.error = Some(e.to_string());
        }
    }

    report.result = Some(result);
    report
}
