use anyhow::Context;
use console::style;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use tracing::info;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::data::load_complaints;
use crate::embeddings::EmbeddingClient;
use crate::indexer::Indexer;
use crate::pipeline::{PipelineAnswer, RagPipeline};
use crate::retriever::Filters;
use crate::{RagError, Result};

/// Load the persisted corpus if its artifacts exist, otherwise build it from
/// the complaints CSV and persist it. `rebuild` forces a fresh build.
#[inline]
pub fn prepare_corpus(
    config: &Config,
    embedder: &EmbeddingClient,
    rebuild: bool,
) -> Result<Corpus> {
    let index_path = config.index_path();
    let metadata_path = config.metadata_path();

    if !rebuild && Corpus::exists(&index_path, &metadata_path) {
        println!(
            "{} Loading existing corpus from {}",
            style("📂").cyan(),
            config.data.vector_store_path.display()
        );
        let corpus = Corpus::load(&index_path, &metadata_path, &config.ollama.embedding_model)?;
        println!(
            "{} Corpus ready: {} chunks",
            style("✓").green(),
            corpus.len()
        );
        return Ok(corpus);
    }

    embedder
        .health_check()
        .context("Ollama is not reachable; is it running?")?;
    embedder
        .validate_model()
        .context("Embedding model is not available in Ollama")?;

    println!(
        "{} Building corpus from {}",
        style("🔨").cyan(),
        config.data.path.display()
    );

    let records = load_complaints(&config.data.path, &config.data.narrative_column)?;
    let corpus = Indexer::new(config.chunking, embedder).build(&records)?;
    corpus.save(&index_path, &metadata_path)?;

    println!(
        "{} Indexed {} records into {} chunks",
        style("✓").green(),
        records.len(),
        corpus.len()
    );

    Ok(corpus)
}

/// Answer a single question and print the result.
#[inline]
pub fn ask_once(pipeline: &RagPipeline<'_>, question: &str, filters: &Filters) {
    info!("Answering one-shot question");
    let result = pipeline.run(question, filters);
    render_answer(&result);
}

const REPL_HELP: &str = "\
Commands:
  help       Show this help
  examples   Show example business questions
  exit       Leave the session (also: quit)

Anything else is treated as a question about the complaint data.";

/// Interactive question loop. Runs until the user types `exit` or `quit`, or
/// input is closed.
#[inline]
pub fn interactive(pipeline: &RagPipeline<'_>, filters: &Filters) -> Result<()> {
    println!();
    println!(
        "{} Complaint insights session. Type {} for commands.",
        style("💬").cyan(),
        style("help").yellow()
    );

    let theme = ColorfulTheme::default();

    loop {
        println!();
        let line: String = Input::with_theme(&theme)
            .with_prompt("Question")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| RagError::Other(anyhow::Error::new(e)))?;

        match line.trim() {
            "" => continue,
            "exit" | "quit" => {
                println!("{} Goodbye!", style("👋").cyan());
                return Ok(());
            }
            "help" => {
                println!("{}", REPL_HELP);
            }
            "examples" => {
                println!("{}", crate::validator::SUGGESTED_QUESTIONS);
            }
            question => {
                let result = pipeline.run(question, filters);
                render_answer(&result);
            }
        }
    }
}

/// Print the answer, then the supporting excerpts it was grounded on.
fn render_answer(result: &PipelineAnswer) {
    println!();
    println!("{}", style("Answer").bold().underlined());
    println!("{}", result.answer);

    if result.chunks.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        style(format!("Supporting excerpts ({})", result.chunks.len()))
            .bold()
            .underlined()
    );

    for (i, chunk) in result.chunks.iter().enumerate() {
        let meta = &chunk.metadata;
        let product = meta.product.as_deref().unwrap_or("unknown product");
        let market = meta.market.as_deref().unwrap_or("unknown market");

        println!();
        println!(
            "{} {} | {} | distance {:.4}",
            style(format!("[{}]", i + 1)).cyan(),
            style(product).yellow(),
            market,
            chunk.score
        );
        println!("{}", excerpt(&chunk.text));
    }
}

/// Truncate long chunk text for terminal display, on a char boundary.
fn excerpt(text: &str) -> String {
    const MAX_DISPLAY_CHARS: usize = 240;
    let mut out: String = text.chars().take(MAX_DISPLAY_CHARS).collect();
    if text.chars().count() > MAX_DISPLAY_CHARS {
        out.push('…');
    }
    out
}
