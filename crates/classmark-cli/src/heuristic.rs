//! A lexical analyzer for hosts without a linguistic model.
//!
//! [`HeuristicAnalyzer`] proposes entities from surface cues only:
//!
//! - a capitalized word that does not open a sentence is a CLASS,
//! - the first content word after a possession cue (`has`, `with`, `of`, ...)
//!   is an ATTRIBUTE,
//! - the first content word after a modal verb (`can`, `must`, ...) is a
//!   METHOD.
//!
//! Articles and a few adverbs are skipped when looking for that content
//! word. Cues do not carry over a sentence boundary.

use log::debug;

use classmark::{
    EntityTag, Span,
    preannotate::{Analyzer, AnalyzerError, Candidate, CandidateStream},
    text,
};

const ATTRIBUTE_CUES: &[&str] = &["has", "have", "with", "containing", "contains", "of"];
const METHOD_CUES: &[&str] = &["can", "may", "must", "should", "will"];
const FILLERS: &[&str] = &[
    "a", "an", "the", "each", "every", "some", "many", "several", "its", "their", "also", "not",
    "only",
];
const SENTENCE_ENDS: [char; 4] = ['.', '!', '?', '\n'];

/// Proposes candidates from capitalization and cue words.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for HeuristicAnalyzer {
    fn analyze<'a>(&'a self, text: &'a str) -> Result<CandidateStream<'a>, AnalyzerError> {
        debug!(chars = text::char_len(text); "Heuristic analysis");
        let candidates = text::words(text)
            .scan(Scanner::default(), move |scanner, (span, word)| {
                Some(scanner.step(text, span, word))
            })
            .flatten()
            .map(Ok);
        Ok(Box::new(candidates))
    }
}

#[derive(Debug, Default)]
struct Scanner {
    previous_end: Option<usize>,
    cue: Option<EntityTag>,
}

impl Scanner {
    fn step(&mut self, text: &str, span: Span, word: &str) -> Option<Candidate> {
        let sentence_start = match self.previous_end {
            None => true,
            Some(end) => Span::try_new(end, span.start())
                .and_then(|gap| text::slice(text, gap))
                .is_some_and(|gap| gap.contains(SENTENCE_ENDS)),
        };
        self.previous_end = Some(span.end());
        if sentence_start {
            self.cue = None;
        }

        let lower = word.to_lowercase();
        let lower = lower.as_str();
        if lower.starts_with(|c: char| c.is_ascii_digit()) || FILLERS.contains(&lower) {
            return None;
        }
        if ATTRIBUTE_CUES.contains(&lower) {
            self.cue = Some(EntityTag::Attribute);
            return None;
        }
        if METHOD_CUES.contains(&lower) {
            self.cue = Some(EntityTag::Method);
            return None;
        }

        let cue = self.cue.take();
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        let label = if capitalized && !sentence_start {
            EntityTag::Class
        } else {
            cue?
        };
        Some(Candidate::new(word, label, span))
    }
}

#[cfg(test)]
mod tests {
    use classmark::preannotate::{CancelToken, structure_candidates};

    use super::*;

    fn candidates(text: &str) -> Vec<(String, EntityTag, Span)> {
        HeuristicAnalyzer::new()
            .analyze(text)
            .unwrap()
            .map(|candidate| {
                let candidate = candidate.unwrap();
                (
                    candidate.text().to_string(),
                    candidate.label(),
                    candidate.span(),
                )
            })
            .collect()
    }

    #[test]
    fn test_sample_sentence() {
        assert_eq!(
            candidates("A User can borrow a Book. Each Book has a title."),
            vec![
                ("User".to_string(), EntityTag::Class, Span::new(2..6)),
                ("borrow".to_string(), EntityTag::Method, Span::new(11..17)),
                ("Book".to_string(), EntityTag::Class, Span::new(20..24)),
                ("Book".to_string(), EntityTag::Class, Span::new(31..35)),
                ("title".to_string(), EntityTag::Attribute, Span::new(42..47)),
            ]
        );
    }

    #[test]
    fn test_sentence_initial_word_is_not_a_class() {
        let found = candidates("Librarians register Members.");
        assert_eq!(
            found,
            vec![("Members".to_string(), EntityTag::Class, Span::new(20..27))]
        );
    }

    #[test]
    fn test_cue_does_not_cross_sentences() {
        assert!(candidates("It is what it can. 42 things.").is_empty());
    }

    #[test]
    fn test_character_offsets() {
        let found = candidates("Ein Kunde hat das Äpfel. Der Kunde can zahlen.");
        assert_eq!(found[0], ("Kunde".to_string(), EntityTag::Class, Span::new(4..9)));
        assert!(found.contains(&("Äpfel".to_string(), EntityTag::Class, Span::new(18..23))));
        assert!(found.contains(&("zahlen".to_string(), EntityTag::Method, Span::new(39..45))));
    }

    #[test]
    fn test_feeds_structurer() {
        let text = "A Library has a catalog and a Member can reserve.";
        let analyzer = HeuristicAnalyzer::new();
        let stream = analyzer.analyze(text).unwrap();
        let (model, report) = structure_candidates(stream, "String", &CancelToken::new()).unwrap();

        assert_eq!(report.accepted, 4);
        let classes = model.classes();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name(), "Library");
        assert_eq!(classes[0].attributes()[0].name(), "catalog");
        assert_eq!(classes[1].name(), "Member");
        assert_eq!(classes[1].methods()[0].name(), "reserve");
    }
}
