//! In-memory BM25 retriever.
//!
//! ```text
//! score = Σ IDF(q) × f(q,D)×(k1+1) / (f(q,D) + k1×(1-b+b×|D|/avgdl))
//! IDF(q) = ln((N - n(q) + 0.5) / (n(q) + 0.5) + 1)
//! ```
//!
//! Japanese and Chinese text has no spaces between words, so runs of CJK
//! characters are indexed as overlapping character bigrams.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use faq_core::{Document, LexicalConfig, RankedList, Result, Retriever};

/// BM25 retriever over a fixed set of documents.
pub struct Bm25Retriever {
    documents: Vec<Document>,
    /// Term frequencies per document.
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
    /// Number of documents returned per query.
    k: usize,
    k1: f64,
    b: f64,
}

impl Bm25Retriever {
    /// Build a retriever from documents.
    pub fn from_documents(documents: Vec<Document>, config: &LexicalConfig) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(&d.content)).collect();

        let doc_lens: Vec<usize> = tokenized.iter().map(Vec::len).collect();
        let total_len: usize = doc_lens.iter().sum();
        let avgdl = if total_len == 0 {
            1.0
        } else {
            total_len as f64 / documents.len() as f64
        };

        let mut term_freqs = Vec::with_capacity(tokenized.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        for terms in tokenized {
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for term in terms {
                *freqs.entry(term).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let n = documents.len() as f64;
        let idf = doc_freqs
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term, ((n - df + 0.5) / (df + 0.5) + 1.0).ln())
            })
            .collect();

        debug!("Built BM25 index over {} documents", documents.len());

        Self {
            documents,
            term_freqs,
            doc_lens,
            avgdl,
            idf,
            k: config.k,
            k1: config.k1,
            b: config.b,
        }
    }

    /// Build a retriever from raw texts.
    pub fn from_texts<I, S>(texts: I, config: &LexicalConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts.into_iter().map(Document::new).collect();
        Self::from_documents(documents, config)
    }

    /// Set the number of documents returned per query.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// BM25 score of every document for the query, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_terms = tokenize(query);

        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &doc_len)| {
                let length_norm = 1.0 - self.b + self.b * (doc_len as f64 / self.avgdl);
                query_terms
                    .iter()
                    .filter_map(|term| {
                        let tf = *freqs.get(term)? as f64;
                        let idf = self.idf.get(term).copied().unwrap_or(0.0);
                        Some(idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * length_norm))
                    })
                    .sum::<f64>()
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for Bm25Retriever {
    fn name(&self) -> &str {
        "bm25"
    }

    async fn retrieve(&self, query: &str) -> Result<RankedList> {
        let scores = self.scores(query);

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        // Stable sort keeps corpus order for equal scores.
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        ranked.truncate(self.k);

        debug!("BM25 returned {} of {} documents", ranked.len(), self.documents.len());

        Ok(ranked.into_iter().map(|i| self.documents[i].clone()).collect())
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3005}'                  // 々
        | '\u{3040}'..='\u{309F}'   // Hiragana
        | '\u{30A0}'..='\u{30FF}'   // Katakana
        | '\u{3400}'..='\u{4DBF}'   // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{F900}'..='\u{FAFF}'   // CJK Compatibility Ideographs
        | '\u{AC00}'..='\u{D7AF}'   // Hangul syllables
    )
}

fn push_cjk_run(run: &mut Vec<char>, tokens: &mut Vec<String>) {
    match run.len() {
        0 => {}
        1 => tokens.push(run[0].to_string()),
        _ => tokens.extend(run.windows(2).map(|pair| pair.iter().collect::<String>())),
    }
    run.clear();
}

fn push_word(word: &mut String, tokens: &mut Vec<String>) {
    if !word.is_empty() {
        tokens.push(std::mem::take(word));
    }
}

/// Tokenize text for BM25.
///
/// NFKC-normalizes (folding full-width forms), lowercases, and splits on
/// anything that is not alphanumeric. Runs of CJK characters become
/// character bigrams; a lone CJK character is its own token.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();

    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    for c in normalized.chars() {
        if is_cjk(c) {
            push_word(&mut word, &mut tokens);
            cjk_run.push(c);
        } else if c.is_alphanumeric() {
            push_cjk_run(&mut cjk_run, &mut tokens);
            word.push(c);
        } else {
            push_word(&mut word, &mut tokens);
            push_cjk_run(&mut cjk_run, &mut tokens);
        }
    }
    push_word(&mut word, &mut tokens);
    push_cjk_run(&mut cjk_run, &mut tokens);

    tokens
}
