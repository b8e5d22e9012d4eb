use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing::error;
use tracing_subscriber::EnvFilter;

use complaint_insights::commands;
use complaint_insights::config::Config;
use complaint_insights::embeddings::EmbeddingClient;
use complaint_insights::generator::GenerationClient;
use complaint_insights::pipeline::RagPipeline;
use complaint_insights::retriever::Filters;
use complaint_insights::validator::QueryValidator;

/// Question answering over financial customer complaints.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Rebuild the vector store even if persisted artifacts exist
    #[arg(long)]
    rebuild_index: bool,

    /// Ask one question and exit instead of starting a session
    #[arg(long)]
    question: Option<String>,

    /// Only consider complaints about this product
    #[arg(long)]
    product: Option<String>,

    /// Only consider complaints from this market
    #[arg(long)]
    market: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the complaints CSV, overriding the configured one
    #[arg(long)]
    data: Option<PathBuf>,
}

impl Cli {
    fn filters(&self) -> Filters {
        let mut filters = Filters::new();
        if let Some(product) = &self.product {
            filters.insert("product".to_string(), product.clone());
        }
        if let Some(market) = &self.market {
            filters.insert("market".to_string(), market.clone());
        }
        filters
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data) = &cli.data {
        config.data.path = data.clone();
    }

    let embedder = EmbeddingClient::new(&config.ollama)?;
    let corpus = commands::prepare_corpus(&config, &embedder, cli.rebuild_index)?;

    let validator = QueryValidator::new()?;
    let model = GenerationClient::new(&config.ollama, &config.generation)?;
    let pipeline = RagPipeline::new(
        &corpus,
        &embedder,
        &validator,
        &model,
        config.retrieval.top_k,
    );

    let filters = cli.filters();

    match &cli.question {
        Some(question) => {
            commands::ask_once(&pipeline, question, &filters);
            Ok(())
        }
        None => Ok(commands::interactive(&pipeline, &filters)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_question_with_filters() {
        let cli = Cli::parse_from([
            "complaint-insights",
            "--question",
            "What are the top BNPL complaints?",
            "--product",
            "BNPL",
            "--market",
            "Kenya",
        ]);

        assert_eq!(
            cli.question.as_deref(),
            Some("What are the top BNPL complaints?")
        );
        let filters = cli.filters();
        assert_eq!(filters.get("product").map(String::as_str), Some("BNPL"));
        assert_eq!(filters.get("market").map(String::as_str), Some("Kenya"));
        assert!(!cli.rebuild_index);
    }

    #[test]
    fn defaults_to_interactive_with_no_filters() {
        let cli = Cli::parse_from(["complaint-insights"]);
        assert!(cli.question.is_none());
        assert!(cli.filters().is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn rebuild_flag_is_recognized() {
        let cli = Cli::parse_from(["complaint-insights", "--rebuild-index"]);
        assert!(cli.rebuild_index);
    }

    #[test]
    fn data_path_override_is_recognized() {
        let cli = Cli::parse_from(["complaint-insights", "--data", "other/complaints.csv"]);
        assert_eq!(cli.data, Some(PathBuf::from("other/complaints.csv")));
    }
}
