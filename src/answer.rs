//! Heuristic answers to free-text questions about one endpoint's documentation page.

use scraper::{ElementRef, Html, Selector};

use crate::docs_parser::{collapse_whitespace, extract_body_text};

const OVERVIEW_MIN_LEN: usize = 100;
const OVERVIEW_FALLBACK_LEN: usize = 500;
const FULL_TEXT_LEN: usize = 2000;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Overview,
    Parameters,
    Examples,
    General,
}

impl QuestionKind {
    pub fn classify(question: &str) -> Self {
        let question = question.to_lowercase();
        if question.contains("overview") || question.contains("what is") {
            QuestionKind::Overview
        } else if question.contains("parameter") {
            QuestionKind::Parameters
        } else if question.contains("example") || question.contains("ejemplo") {
            QuestionKind::Examples
        } else {
            QuestionKind::General
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn is_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// First paragraph long enough to be prose and not a copyright notice.
fn overview_paragraph(document: &Html) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| {
            text.chars().count() > OVERVIEW_MIN_LEN
                && !text.contains('\u{a9}')
                && !text.contains("Copyright")
        })
}

/// Text between the first heading mentioning one of `keywords` and the next heading.
fn section_after_heading(document: &Html, keywords: &[&str]) -> Option<String> {
    let selector = Selector::parse(HEADINGS).ok()?;
    let heading = document.select(&selector).find(|heading| {
        let text = element_text(*heading).to_lowercase();
        keywords.iter().any(|keyword| text.contains(keyword))
    })?;

    let mut parts = vec![element_text(heading)];
    for sibling in heading.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            if is_heading(element) {
                break;
            }
            parts.push(element_text(element));
        } else if let Some(text) = sibling.value().as_text() {
            parts.push(text.trim().to_string());
        }
    }
    let section = collapse_whitespace(&parts.join(" "));
    (!section.is_empty()).then_some(section)
}

pub fn answer_question(name: &str, code: &str, question: &str, html: &str) -> String {
    let document = Html::parse_document(html);
    match QuestionKind::classify(question) {
        QuestionKind::Overview => {
            let overview = overview_paragraph(&document).unwrap_or_else(|| {
                truncate(&extract_body_text(html), OVERVIEW_FALLBACK_LEN)
            });
            format!("**Overview of {name} ({code}):**\n\n{overview}")
        }
        QuestionKind::Parameters => match section_after_heading(&document, &["parameter"]) {
            Some(section) => format!("**Parameters of {name} ({code}):**\n\n{section}"),
            None => format!("No specific parameter sections found for {name} ({code})."),
        },
        QuestionKind::Examples => match section_after_heading(&document, &["example", "ejemplo"]) {
            Some(section) => format!("**Examples of {name} ({code}):**\n\n{section}"),
            None => format!("No specific examples sections found for {name} ({code})."),
        },
        QuestionKind::General => {
            let text = truncate(&extract_body_text(html), FULL_TEXT_LEN);
            format!("**Documentation of {name} ({code}):**\n\n{text}")
        }
    }
}
