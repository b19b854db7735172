//! Study-session policy on top of [`FlashcardBank::sample`].

use tracing::info;

use crate::{
    bank::{FlashcardBank, Question},
    error::{Error, Result},
};

/// Pick the topic to study: a non-blank custom topic (trimmed) wins over the
/// selection, which is used as given.
///
/// # Errors
/// `Validation` when neither is given.
pub fn resolve_topic(selected: Option<&str>, custom: Option<&str>) -> Result<String> {
    let custom = custom.map(str::trim).filter(|t| !t.is_empty());
    let selected = selected.filter(|t| !t.trim().is_empty());
    custom
        .or(selected)
        .map(str::to_string)
        .ok_or_else(|| Error::Validation("Please choose or enter a topic".to_string()))
}

/// Parse the requested number of cards from form input.
///
/// # Errors
/// `Validation` for missing, non-numeric or non-positive input.
pub fn parse_count(input: Option<&str>) -> Result<usize> {
    let not_available = || {
        Error::Validation("Flashcards not available: enter a positive number of cards".to_string())
    };
    let raw = input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(not_available)?;
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).map_err(|_| not_available()),
        _ => Err(not_available()),
    }
}

/// Draw a study session: up to `count` distinct cards from `topic`.
///
/// # Errors
/// `NotFound` when the topic is unknown or has no questions, `Validation`
/// for bad count input.
pub async fn study(
    bank: &FlashcardBank,
    topic: &str,
    count_input: Option<&str>,
) -> Result<Vec<Question>> {
    let count = parse_count(count_input)?;
    let cards = bank.sample(topic, count).await?;
    if cards.is_empty() {
        return Err(Error::NotFound(format!(
            "No questions available for topic {topic}"
        )));
    }
    info!(topic, requested = count, drawn = cards.len(), "study session drawn");
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_topic_overrides_selection() {
        assert_eq!(
            resolve_topic(Some("math"), Some(" chess ")).ok().as_deref(),
            Some("chess")
        );
        assert_eq!(
            resolve_topic(Some("math"), Some("   ")).ok().as_deref(),
            Some("math")
        );
        assert!(matches!(
            resolve_topic(None, Some("")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn selected_topic_is_kept_verbatim() {
        assert_eq!(
            resolve_topic(Some(" padded "), None).ok().as_deref(),
            Some(" padded ")
        );
        assert_eq!(
            resolve_topic(Some(" padded "), Some("  ")).ok().as_deref(),
            Some(" padded ")
        );
        assert!(matches!(
            resolve_topic(Some("   "), None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn count_must_be_a_positive_integer() {
        assert_eq!(parse_count(Some("3")).ok(), Some(3));
        assert_eq!(parse_count(Some(" 12 ")).ok(), Some(12));
        for bad in [None, Some(""), Some("abc"), Some("0"), Some("-2"), Some("1.5")] {
            assert!(
                matches!(parse_count(bad), Err(Error::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn unknown_topic_yields_notice_not_fault() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bank = FlashcardBank::new(dir.path().join("questions.json"));
        let result = study(&bank, "astronomy", Some("2")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn count_is_clamped_to_available() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bank = FlashcardBank::new(dir.path().join("questions.json"));
        bank.add_question("math", "2+2?", "4").await.expect("add");
        let cards = study(&bank, "math", Some("10")).await.expect("study");
        assert_eq!(cards, vec![Question::new("2+2?", "4")]);
    }
}
