#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use fancy_regex::Regex;
use tracing::debug;

/// Outcome of query classification. A rejection is a normal pipeline
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub message: String,
}

/// Classification seam so the heuristic gate can later be swapped for a
/// learned classifier without touching the pipeline.
pub trait QueryClassifier {
    fn classify(&self, query: &str) -> Verdict;
}

/// Heuristic pre-filter that rejects casual conversation and off-topic input
/// before any retrieval or generation cost is spent. False positives and
/// negatives are expected and acceptable.
pub struct QueryValidator {
    casual_patterns: Vec<Regex>,
    business_patterns: Vec<Regex>,
}

const MIN_QUERY_LENGTH: usize = 2;
const MIN_FALLBACK_TOKENS: usize = 4;

const EMPTY_MESSAGE: &str = "Please provide a specific question about customer complaints.";
const CASUAL_MESSAGE: &str = "I'm here to help analyze customer complaints for business insights. \
     Please ask about specific products or issues.";
const NOT_BUSINESS_MESSAGE: &str = "This doesn't appear to be a business analysis question. \
     Ask about products, markets, or complaint trends.";
const ACCEPTED_MESSAGE: &str = "Valid business query";

/// Static guidance surfaced alongside rejections.
pub const SUGGESTED_QUESTIONS: &str = "\
Example business questions:

Product insights:
- What are the top complaints about BNPL in Kenya?
- What emerging issues are we seeing with mobile money transfers?
- Analyze complaint trends for credit cards in Uganda

Operational issues:
- What are the most common app functionality complaints?
- What payment processing issues are customers reporting?

Geographic analysis:
- Compare complaint themes between Kenya and Tanzania
- What are the unique issues in the Rwandan market?

Strategic questions:
- What regulatory concerns are emerging from complaints?
- Identify potential fraud patterns from complaints
";

impl QueryValidator {
    #[inline]
    pub fn new() -> Result<Self> {
        let casual = [
            r"^(hi|hello|hey|howdy|greetings|sup|yo|what's up|wassup)\b",
            r"^(thanks|thank you|thx|ty|cheers)\b",
            r"^(bye|goodbye|see ya|cya|later)\b",
            r"^(ok|okay|k|alright|sure|fine)\b",
            r"^[?.!,;:]",
            r"^.{1,3}$",
        ];

        let business = [
            r"^(top|most common|frequent|common|biggest|emerging) (issue|problem|complaint|concern)",
            r"^(what are|list|identify|analyze) (the|some) (common|frequent|top)",
            r"^(trend|pattern|theme)s? (in|with|for)",
            r"^(credit card|loan|bnpl|buy now pay later|savings|money transfer)",
            r"^(app|mobile|digital|platform) (issue|problem|bug|error)",
            r"^(kenya|uganda|tanzania|rwanda|east africa)",
            r"^(customer satisfaction|user experience|cx|support)",
            r"^(regulatory|compliance|cbk|central bank)",
        ];

        Ok(Self {
            casual_patterns: compile_all(&casual).context("Failed to compile casual patterns")?,
            business_patterns: compile_all(&business)
                .context("Failed to compile business patterns")?,
        })
    }
}

impl QueryClassifier for QueryValidator {
    #[inline]
    fn classify(&self, query: &str) -> Verdict {
        let query = query.trim().to_lowercase();

        if query.len() < MIN_QUERY_LENGTH {
            return rejected(EMPTY_MESSAGE);
        }

        if matches_any(&self.casual_patterns, &query) {
            debug!("Query rejected as casual conversation");
            return rejected(CASUAL_MESSAGE);
        }

        if matches_any(&self.business_patterns, &query) {
            return accepted();
        }

        // No pattern matched either way: fall back on query length as a
        // rough signal of a real question.
        if query.split_whitespace().count() < MIN_FALLBACK_TOKENS {
            debug!("Query rejected: too short to be a business question");
            return rejected(NOT_BUSINESS_MESSAGE);
        }

        accepted()
    }
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid pattern: {}", p)))
        .collect()
}

fn matches_any(patterns: &[Regex], query: &str) -> bool {
    patterns
        .iter()
        .any(|p| p.is_match(query).unwrap_or(false))
}

fn accepted() -> Verdict {
    Verdict {
        accepted: true,
        message: ACCEPTED_MESSAGE.to_string(),
    }
}

fn rejected(message: &str) -> Verdict {
    Verdict {
        accepted: false,
        message: message.to_string(),
    }
}
