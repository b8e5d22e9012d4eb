
use tracing::{debug, info, warn};

use crate::corpus::Corpus;
use crate::embeddings::Embedder;
use crate::generator::{AnswerGenerator, TextGenerator};
use crate::retriever::{Filters, RetrievedChunk, Retriever};
use crate::validator::{QueryClassifier, SUGGESTED_QUESTIONS};

const NO_RESULTS_MESSAGE: &str =
    "No relevant complaint data was found for this question. Try rephrasing it \
     or removing filters.";
const RETRIEVAL_FAILED_MESSAGE: &str =
    "Complaint retrieval failed. Check that the embedding service is running \
     and try again.";
const GENERATION_FAILED_MESSAGE: &str =
    "Answer generation failed. The relevant complaint excerpts were retrieved \
     but could not be summarized; try again shortly.";

/// The outcome of asking one question. Always produced; pipeline failures
/// degrade into explanatory messages rather than errors.
#[derive(Debug, Clone)]
pub struct PipelineAnswer {
    pub answer: String,
    pub chunks: Vec<RetrievedChunk>,
}

impl PipelineAnswer {
    fn message_only(message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            chunks: Vec::new(),
        }
    }
}

/// Orchestrates one question end to end: validation gate, retrieval,
/// then generation. Stages run strictly in that order and each stage
/// only runs if the previous one produced something to work with.
pub struct RagPipeline<'a> {
    validator: &'a dyn QueryClassifier,
    retriever: Retriever<'a>,
    generator: AnswerGenerator<'a>,
    top_k: usize,
}

impl<'a> RagPipeline<'a> {
    #[inline]
    pub fn new(
        corpus: &'a Corpus,
        embedder: &'a dyn Embedder,
        validator: &'a dyn QueryClassifier,
        model: &'a dyn TextGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            validator,
            retriever: Retriever::new(corpus, embedder),
            generator: AnswerGenerator::new(model),
            top_k,
        }
    }

    /// Answer one question. Never returns an error: every failure mode maps
    /// to a `PipelineAnswer` explaining what happened.
    #[inline]
    pub fn run(&self, question: &str, filters: &Filters) -> PipelineAnswer {
        let verdict = self.validator.classify(question);
        if !verdict.accepted {
            debug!("Question rejected by validation gate");
            return PipelineAnswer::message_only(format!(
                "{}\n\n{}",
                verdict.message, SUGGESTED_QUESTIONS
            ));
        }

        let chunks = match self.retriever.retrieve(question, self.top_k, filters) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                return PipelineAnswer::message_only(RETRIEVAL_FAILED_MESSAGE);
            }
        };

        if chunks.is_empty() {
            info!("No chunks matched the question, skipping generation");
            return PipelineAnswer::message_only(NO_RESULTS_MESSAGE);
        }

        match self.generator.answer(&chunks, question) {
            Ok(answer) => PipelineAnswer { answer, chunks },
            Err(e) => {
                warn!("Generation failed: {}", e);
                PipelineAnswer::message_only(GENERATION_FAILED_MESSAGE)
            }
        }
    }
}
