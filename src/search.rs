//! Relevance ranking over a catalog snapshot.
//!
//! For every query term occurrence a field adds its weight once when the term is a
//! substring of the lower-cased field, so a repeated term counts each time. Results are ordered by relevance, highest first, with ties
//! kept in catalog order.

use itertools::Itertools;

use crate::config::SearchWeights;
use crate::endpoint::{EndpointDescriptor, SearchResult};

/// Lower-cased terms long enough to count, in query order, repeats included.
pub fn query_terms(query: &str, min_len: usize) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|term| term.chars().count() >= min_len)
        .map(str::to_string)
        .collect()
}

fn score(endpoint: &EndpointDescriptor, terms: &[String], weights: &SearchWeights) -> Option<SearchResult> {
    let name = endpoint.name.to_lowercase();
    let description = endpoint.description.as_deref().map(str::to_lowercase);
    let category = endpoint.category.to_lowercase();
    let content = endpoint.content.as_deref().map(str::to_lowercase);

    let term_score = |term: &str| -> u32 {
        let fields = [
            (Some(name.as_str()), weights.name),
            (description.as_deref(), weights.description),
            (Some(category.as_str()), weights.category),
            (content.as_deref(), weights.content),
        ];
        fields
            .iter()
            .filter(|(field, _)| field.is_some_and(|f| f.contains(term)))
            .map(|(_, weight)| *weight)
            .sum()
    };

    let scores: Vec<(&String, u32)> = terms.iter().map(|term| (term, term_score(term))).collect();
    let relevance: u32 = scores.iter().map(|(_, score)| score).sum();
    let matched_terms = scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .map(|(term, _)| term.to_string())
        .unique()
        .collect();

    (relevance > 0).then(|| SearchResult {
        endpoint: endpoint.clone(),
        relevance,
        matched_terms,
    })
}

pub fn search(query: &str, endpoints: &[EndpointDescriptor], weights: &SearchWeights) -> Vec<SearchResult> {
    let terms = query_terms(query, weights.min_term_len);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = endpoints
        .iter()
        .filter_map(|endpoint| score(endpoint, &terms, weights))
        .collect();
    // stable: equal relevance keeps catalog order
    results.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    results
}
