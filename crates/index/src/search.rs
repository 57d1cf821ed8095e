// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyword and import-suggestion queries.
//!
//! Each keyword becomes a sub-query: fuzzy (with transpositions) when
//! requested, otherwise a prefix expanded against the term dictionary and
//! rewritten into a scoring boolean query, so length normalization keeps
//! ranking shorter matches first. Scores are multiplied by `1/name-length`
//! from the fast field, which is the load-bearing half of the ranking.

use std::collections::{BTreeSet, HashMap};

use javelin_core::symbol::{SymbolSearchResult, TypeSymbol};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{DocId, Score, SegmentReader, TantivyDocument, Term};

use crate::store::{result_of, IndexError, SymbolIndex, DOC_TYPE_TYPE};
use crate::tokenizer::split_type_name;

/// Similarity floor for fuzzy keyword matching.
const FUZZY_MIN_SIMILARITY: f32 = 0.6;

/// Keyword search over the whole index.
///
/// Keywords are mandatory (MUST) and prefix-matched; results come back in
/// relevance order, shorter fully-qualified names first.
pub fn keyword_search(
    index: &SymbolIndex,
    keywords: &[String],
    limit: usize,
    types_only: bool,
) -> Result<Vec<SymbolSearchResult>, IndexError> {
    search(index, keywords, limit, types_only, false)
}

/// Ranked import candidates for each requested type name.
///
/// Keyword set per name: the name itself plus its camel-case splits; the
/// search is types-only and fuzzy; ranking is (edit distance of the local
/// name ascending, full-name length ascending).
pub fn import_suggestions(
    index: &SymbolIndex,
    type_names: &[String],
    limit: usize,
) -> Result<Vec<Vec<TypeSymbol>>, IndexError> {
    let mut memo = LevenshteinMemo::default();
    let mut out = Vec::with_capacity(type_names.len());
    for requested in type_names {
        let mut keywords = vec![requested.clone()];
        keywords.extend(split_type_name(requested));
        keywords.dedup();

        let mut seen = BTreeSet::new();
        let mut candidates: Vec<TypeSymbol> = search(index, &keywords, limit.max(1) * 4, true, true)?
            .into_iter()
            .filter_map(|result| match result {
                SymbolSearchResult::Type(t) => Some(t),
                SymbolSearchResult::Method(_) => None,
            })
            .filter(|t| seen.insert(t.name.clone()))
            .collect();

        candidates.sort_by_key(|t| (memo.distance(&t.local_name, requested), t.name.len()));
        candidates.truncate(limit);
        out.push(candidates);
    }
    Ok(out)
}

fn search(
    index: &SymbolIndex,
    keywords: &[String],
    limit: usize,
    types_only: bool,
    fuzzy: bool,
) -> Result<Vec<SymbolSearchResult>, IndexError> {
    let fields = index.fields();
    let searcher = index.searcher();
    let field = if types_only {
        fields.local_name_tags
    } else {
        fields.tags
    };

    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let keyword_occur = if fuzzy { Occur::Should } else { Occur::Must };
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    if types_only {
        let term = Term::from_field_text(fields.doc_type, DOC_TYPE_TYPE);
        clauses.push((
            Occur::Must,
            Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
        ));
    }
    for keyword in &keywords {
        let subquery: Box<dyn Query> = if fuzzy {
            // Prefix-fuzzy: tolerates transposition typos and still reaches
            // terms the keyword merely starts (List → Listicle).
            let term = Term::from_field_text(field, keyword);
            Box::new(FuzzyTermQuery::new_prefix(
                term,
                fuzzy_distance(keyword),
                true,
            ))
        } else {
            prefix_query(&searcher, field, keyword)?
        };
        clauses.push((keyword_occur, subquery));
    }
    let query = BooleanQuery::new(clauses);

    let name_len_field = "nameLen";
    let collector = TopDocs::with_limit(limit).tweak_score(move |segment: &SegmentReader| {
        let lengths = segment.fast_fields().u64(name_len_field).ok();
        move |doc: DocId, score: Score| {
            let len = lengths
                .as_ref()
                .and_then(|column| column.first(doc))
                .unwrap_or(1)
                .max(1);
            score / len as f32
        }
    });

    let hits = searcher.search(&query, &collector)?;
    let mut results = Vec::with_capacity(hits.len());
    for (_score, address) in hits {
        let doc: TantivyDocument = searcher.doc(address)?;
        if let Some(result) = result_of(&fields, &doc) {
            results.push(result);
        }
    }
    Ok(results)
}

/// Expand a prefix against the term dictionary into a scoring boolean
/// query. A constant-score rewrite would flatten the length normalization,
/// so every expanded term stays a scored term query.
fn prefix_query(
    searcher: &tantivy::Searcher,
    field: tantivy::schema::Field,
    prefix: &str,
) -> Result<Box<dyn Query>, IndexError> {
    let mut terms: BTreeSet<String> = BTreeSet::new();
    for segment in searcher.segment_readers() {
        let inverted = segment.inverted_index(field)?;
        let dictionary = inverted.terms();
        let mut stream = dictionary.range().ge(prefix.as_bytes()).into_stream()?;
        while stream.advance() {
            let Ok(key) = std::str::from_utf8(stream.key()) else {
                continue;
            };
            if !key.starts_with(prefix) {
                break;
            }
            terms.insert(key.to_string());
        }
    }

    if terms.is_empty() {
        // Nothing to expand to; keep an exact term so the clause still
        // participates (and matches nothing).
        let term = Term::from_field_text(field, prefix);
        return Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)));
    }

    let expanded: Vec<(Occur, Box<dyn Query>)> = terms
        .into_iter()
        .map(|text| {
            let term = Term::from_field_text(field, &text);
            let query: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
            (Occur::Should, query)
        })
        .collect();
    Ok(Box::new(BooleanQuery::new(expanded)))
}

/// Max edit distance for a keyword at the 0.6 similarity floor, capped at
/// the automaton's limit of 2.
fn fuzzy_distance(keyword: &str) -> u8 {
    let raw = (keyword.chars().count() as f32 * (1.0 - FUZZY_MIN_SIMILARITY)) as u32;
    raw.min(2) as u8
}

/// Levenshtein distance memoized across one request.
#[derive(Default)]
pub struct LevenshteinMemo {
    cache: HashMap<(String, String), usize>,
}

impl LevenshteinMemo {
    pub fn distance(&mut self, a: &str, b: &str) -> usize {
        let key = (a.to_string(), b.to_string());
        if let Some(d) = self.cache.get(&key) {
            return *d;
        }
        let d = levenshtein(a, b);
        self.cache.insert(key, d);
        d
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate() {
        *val = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
