use std::ops::RangeInclusive;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use cardapio_kb::backend::{detect_ocr_engine, OcrEngine, PdfPageSource};
use cardapio_kb::checkpoint::Checkpoint;
use cardapio_kb::config::{BatchConfig, PipelineConfig, DEFAULT_CONDITION, MIN_PAGE_TEXT_CHARS};
use cardapio_kb::errors::PipelineError;
use cardapio_kb::extractor::ItemExtractor;
use cardapio_kb::knowledge_base::{build_from_docx, build_from_pages};
use cardapio_kb::model::{ExtractionDocument, KnowledgeBase};
use cardapio_kb::output::{read_json, write_json_atomic};
use cardapio_kb::runs;
use cardapio_kb::structure::structure_document;

#[derive(Parser)]
#[command(
    name = "cardapio-kb",
    about = "Extract a food-item knowledge base from diet menu documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text layer and tables of every PDF page
    Extract,
    /// Extract the text layer, using OCR for pages without one
    ExtractOcr,
    /// OCR every PDF page
    OcrFull {
        /// Only the first N pages
        limit: Option<u32>,
    },
    /// OCR a page range in resumable batches
    OcrBatches {
        /// First page (default: 1)
        start: Option<u32>,
        /// Last page (default: 191)
        end: Option<u32>,
    },
    /// Summarise meals, weekdays and measures per page
    Structure,
    /// Build the knowledge base from the OCR extraction
    KnowledgeBase {
        /// Digestive condition tag for every item
        #[arg(short, long, default_value = DEFAULT_CONDITION)]
        condition: String,
    },
    /// Build the knowledge base from the Word documents
    DocxKnowledgeBase,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    info!("Starting cardapio-kb");

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<PipelineError>() {
                Some(pipeline_err) if pipeline_err.is_fatal() => {
                    eprintln!("ERROR: {pipeline_err}");
                    if let Some(hint) = pipeline_err.hint() {
                        eprintln!("Hint: {hint}");
                    }
                }
                _ => eprintln!("ERROR: {err:#}"),
            }
            error!("Run failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &PipelineConfig) -> Result<()> {
    let paths = &config.paths;
    match command {
        Commands::Extract => {
            let source = open_pdf(&paths.pdf_path)?;
            let doc = runs::extract_direct(&source);
            save(&paths.raw_extraction(), &doc)?;

            println!("Pages: {}", doc.total_pages);
            println!("Characters: {}", doc.metadata.total_chars);
            println!("Tables: {}", doc.total_tables());
            print_page_sample(&doc);
        }
        Commands::ExtractOcr => {
            let source = open_pdf(&paths.pdf_path)?.with_render_dpi(config.ocr.dpi);
            let engine = match detect_ocr_engine(&config.ocr) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    eprintln!("OCR not available: {}", e.hint().unwrap_or("unknown reason"));
                    None
                }
            };
            let doc = runs::extract_with_ocr_fallback(&source, engine.as_deref())?;
            save(&paths.full_extraction(), &doc)?;

            println!("Pages: {}", doc.total_pages);
            println!("Characters: {}", doc.metadata.total_chars);
            println!(
                "Pages with text: {}/{}",
                doc.pages_with_text(MIN_PAGE_TEXT_CHARS),
                doc.total_pages
            );
            println!("Pages with images: {}", doc.pages.iter().filter(|p| p.has_image).count());
            println!("Pages needing OCR: {}", doc.pages.iter().filter(|p| p.ocr_needed).count());
            print_page_sample(&doc);
        }
        Commands::OcrFull { limit } => {
            let source = open_pdf(&paths.pdf_path)?.with_render_dpi(config.ocr.dpi);
            let engine = detect_ocr_engine(&config.ocr)?;
            print_engine(engine.as_ref());
            let doc = runs::extract_full_ocr(&source, engine.as_ref(), &config.ocr, limit)?;
            save(&paths.ocr_extraction(), &doc)?;

            println!("Pages: {}", doc.total_pages);
            println!("Characters: {}", doc.metadata.total_chars);
            println!(
                "Pages with text: {}/{}",
                doc.metadata.pages_with_text.unwrap_or(0),
                doc.total_pages
            );
            print_page_sample(&doc);
        }
        Commands::OcrBatches { start, end } => {
            let pages = page_range(start, end, &config.batch);
            let (first, last) = (*pages.start(), *pages.end());

            let source = open_pdf(&paths.pdf_path)?.with_render_dpi(config.ocr.dpi);
            let engine = detect_ocr_engine(&config.ocr)?;
            print_engine(engine.as_ref());
            let mut checkpoint = Checkpoint::load(&paths.checkpoint())
                .with_context(|| format!("Failed to load {}", paths.checkpoint().display()))?;

            println!("Processing pages {first} to {last}");
            println!("Saving progress to {}", checkpoint.path().display());

            let doc = runs::run_batches(
                &source,
                engine.as_ref(),
                &mut checkpoint,
                pages,
                config.batch.batch_size,
                &config.ocr,
            )?;
            save(&paths.ocr_extraction(), &doc)?;

            println!(
                "Pages processed: {}",
                doc.metadata.pages_processed.unwrap_or(doc.pages.len())
            );
            println!("Characters: {}", doc.metadata.total_chars);
        }
        Commands::Structure => {
            let doc: ExtractionDocument = read_json(&paths.full_extraction())?;
            let structured = structure_document(&doc);
            save(&paths.structured(), &structured)?;

            let summary = &structured.summary;
            println!("Pages with meals: {}", summary.pages_with_meals);
            println!("Pages with weekdays: {}", summary.pages_with_weekdays);
            println!("Pages with tables: {}", summary.pages_with_tables);
            println!("Measures found: {}", summary.total_measures);
        }
        Commands::KnowledgeBase { condition } => {
            let doc: ExtractionDocument = read_json(&paths.ocr_extraction())?;
            let label = file_label(&paths.pdf_path);
            let extractor = ItemExtractor::with_config(config.extractor.clone());
            let kb = build_from_pages(&doc, &condition, &label, &extractor);
            save(&paths.knowledge_base(), &kb)?;

            println!("Items: {}", kb.total_items);
            println!("Pages processed: {}", kb.pages_processed.unwrap_or(0));
            print_item_sample(&kb);
        }
        Commands::DocxKnowledgeBase => {
            let extractor = ItemExtractor::with_config(config.extractor.clone());
            let kb = build_from_docx(&paths.docx_dir, &extractor);
            save(&paths.knowledge_base(), &kb)?;

            println!("Items: {}", kb.total_items);
            print_item_sample(&kb);
        }
    }
    Ok(())
}

/// Page range of a batched run, each missing bound taken from the defaults
fn page_range(start: Option<u32>, end: Option<u32>, batch: &BatchConfig) -> RangeInclusive<u32> {
    start.unwrap_or(batch.default_first_page)..=end.unwrap_or(batch.default_last_page)
}

fn open_pdf(path: &Path) -> Result<PdfPageSource> {
    let source = PdfPageSource::open(path)?;
    println!("PDF: {}", file_label(path));
    Ok(source)
}

fn save<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    write_json_atomic(path, value).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved to {}", path.display());
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_engine(engine: &dyn OcrEngine) {
    println!("OCR: {}", engine.name());
}

fn print_page_sample(doc: &ExtractionDocument) {
    for page in doc.pages.iter().filter(|p| p.has_text(MIN_PAGE_TEXT_CHARS)).take(5) {
        let preview: String = page.text.chars().take(80).collect();
        println!("  [{}] {}", page.number, preview.replace('\n', " | "));
    }
}

fn print_item_sample(kb: &KnowledgeBase) {
    if kb.items.is_empty() {
        return;
    }
    println!("Sample (first 5):");
    for item in kb.items.iter().take(5) {
        println!("  - {item}");
    }
}
