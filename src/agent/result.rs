//! Answer records returned by the retrieval agent.

use serde::Serialize;

/// Placeholder answer when no candidate passes the threshold.
pub const NO_DOCUMENTS_TEXT: &str = "No relevant documents found.";

/// Padding answer when fewer than `n_best` distinct sub-chunks exist.
pub const EXHAUSTED_TEXT: &str = "No more relevant answers found.";

/// Source recorded on a synthesized answer.
pub const SYNTHESIS_SOURCE: &str = "Synthesized from retrieved docs";

/// What produced an [`AnsweredResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// A sub-chunk of a stored document.
    Retrieved,
    /// Generated by the language model from retrieved context.
    Synthesized,
    /// Nothing passed the similarity threshold.
    NoDocuments,
    /// Padding; there were fewer distinct sub-chunks than requested.
    Exhausted,
}

/// One entry of an answer list.
///
/// `source` and `reason` are present for retrieved and synthesized entries;
/// `distance` only for retrieved ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredResult {
    pub kind: AnswerKind,
    pub answer: String,
    pub source: Option<String>,
    pub reason: Option<String>,
    pub distance: Option<f32>,
}

impl AnsweredResult {
    pub fn retrieved(
        answer: impl Into<String>,
        source: &str,
        parent_index: usize,
        sub_index: usize,
        distance: f32,
    ) -> Self {
        Self {
            kind: AnswerKind::Retrieved,
            answer: answer.into(),
            source: Some(source.to_string()),
            reason: Some(format!(
                "Retrieved from chunk {parent_index}.{sub_index} in {source} (distance={distance:.4})."
            )),
            distance: Some(distance),
        }
    }

    pub fn synthesized(answer: impl Into<String>, provider: &str, model: &str) -> Self {
        Self {
            kind: AnswerKind::Synthesized,
            answer: answer.into(),
            source: Some(SYNTHESIS_SOURCE.to_string()),
            reason: Some(format!("Generated using {provider} ({model})")),
            distance: None,
        }
    }

    pub fn no_documents() -> Self {
        Self::placeholder(AnswerKind::NoDocuments, NO_DOCUMENTS_TEXT)
    }

    pub fn exhausted() -> Self {
        Self::placeholder(AnswerKind::Exhausted, EXHAUSTED_TEXT)
    }

    fn placeholder(kind: AnswerKind, text: &str) -> Self {
        Self {
            kind,
            answer: text.to_string(),
            source: None,
            reason: None,
            distance: None,
        }
    }

    pub fn is_retrieved(&self) -> bool {
        self.kind == AnswerKind::Retrieved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieved_reason_format() {
        let result = AnsweredResult::retrieved("The cat sat.", "a.txt", 0, 0, 0.12345);
        assert_eq!(
            result.reason.as_deref(),
            Some("Retrieved from chunk 0.0 in a.txt (distance=0.1235).")
        );
        assert_eq!(result.distance, Some(0.12345));
        assert!(result.is_retrieved());
    }

    #[test]
    fn test_synthesized_fields() {
        let result = AnsweredResult::synthesized("It sat.", "Gemini", "gemini-1.5-flash");
        assert_eq!(result.source.as_deref(), Some(SYNTHESIS_SOURCE));
        assert_eq!(
            result.reason.as_deref(),
            Some("Generated using Gemini (gemini-1.5-flash)")
        );
        assert_eq!(result.distance, None);
    }

    #[test]
    fn test_placeholders() {
        let none = AnsweredResult::no_documents();
        assert_eq!(none.answer, NO_DOCUMENTS_TEXT);
        assert_eq!((none.source, none.reason, none.distance), (None, None, None));
        assert_eq!(AnsweredResult::exhausted().kind, AnswerKind::Exhausted);
    }

    #[test]
    fn test_serializes_kind_snake_case() {
        let value = serde_json::to_value(AnsweredResult::no_documents()).unwrap();
        assert_eq!(value["kind"], "no_documents");
        assert!(value["source"].is_null());
    }
}
