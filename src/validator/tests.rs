use super::*;

fn validator() -> QueryValidator {
    QueryValidator::new().expect("patterns should compile")
}

#[test]
fn rejects_empty_query() {
    let verdict = validator().classify("");
    assert!(!verdict.accepted);
    assert_eq!(verdict.message, EMPTY_MESSAGE);
}

#[test]
fn rejects_greetings() {
    for query in ["hi", "Hello there", "hey", "what's up"] {
        let verdict = validator().classify(query);
        assert!(!verdict.accepted, "{:?} should be rejected", query);
    }
}

#[test]
fn rejects_fillers_and_thanks() {
    for query in ["ok", "okay", "thanks", "thank you so much", "bye"] {
        assert!(!validator().classify(query).accepted, "{:?}", query);
    }
}

#[test]
fn rejects_bare_punctuation_and_tiny_strings() {
    for query in ["?", "!", "...", "ab", "xyz"] {
        assert!(!validator().classify(query).accepted, "{:?}", query);
    }
}

#[test]
fn accepts_business_questions() {
    for query in [
        "What are the top complaints about BNPL in Kenya?",
        "top issues with mobile money",
        "credit card disputes rising in Uganda",
        "Kenya complaint trends for savings products",
        "regulatory concerns raised by customers",
        "app issues reported after the last release",
    ] {
        let verdict = validator().classify(query);
        assert!(verdict.accepted, "{:?} should be accepted", query);
        assert_eq!(verdict.message, ACCEPTED_MESSAGE);
    }
}

#[test]
fn unmatched_queries_fall_back_on_token_count() {
    // Four or more tokens: accepted
    assert!(
        validator()
            .classify("why did refund processing slow down")
            .accepted
    );
    // Fewer than four tokens and no business match: rejected
    let verdict = validator().classify("refund was slow");
    assert!(!verdict.accepted);
    assert_eq!(verdict.message, NOT_BUSINESS_MESSAGE);
}

#[test]
fn classification_normalizes_case_and_whitespace() {
    assert!(!validator().classify("   HI   ").accepted);
    assert!(
        validator()
            .classify("  WHAT ARE THE TOP complaint themes?  ")
            .accepted
    );
}

#[test]
fn suggestions_payload_is_static_and_non_empty() {
    assert!(SUGGESTED_QUESTIONS.contains("BNPL"));
    assert!(SUGGESTED_QUESTIONS.lines().count() > 5);
}
