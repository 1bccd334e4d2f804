//! Concept extraction: raw ingested text -> a short ordered list of topic
//! labels. The LLM does the judgment when configured; otherwise a local
//! frequency heuristic keeps the workflow usable offline. Either way the
//! output passes the same post-processing: trim, drop empties, de-dup
//! case-insensitively, cap the count.

use tracing::instrument;

use crate::config::Prompts;
use crate::error::TutorError;
use crate::llm::Llm;

const MAX_CONCEPTS: usize = 7;
const FALLBACK_MIN_WORD_LEN: usize = 5;

/// Extract concepts from study material. Fails with `EmptyInput` when there
/// is nothing to work from; otherwise returns 1..=7 concepts.
#[instrument(level = "info", skip(llm, prompts, text), fields(text_len = text.len(), llm = llm.is_some()))]
pub async fn extract_concepts(
  llm: Option<&Llm>,
  prompts: &Prompts,
  text: &str,
) -> Result<Vec<String>, TutorError> {
  if text.trim().is_empty() {
    return Err(TutorError::EmptyInput);
  }

  // Upstream failures propagate uninterpreted; the local heuristic only
  // stands in when no LLM is configured at all.
  let concepts = match llm {
    Some(llm) => {
      let raw = llm.extract_concepts(prompts, text).await?;
      let concepts = postprocess(raw);
      if concepts.is_empty() {
        return Err(TutorError::UpstreamGeneration("model returned no usable concepts".into()));
      }
      concepts
    }
    None => {
      let concepts = postprocess(local_concepts(text));
      if concepts.is_empty() {
        return Err(TutorError::EmptyInput);
      }
      concepts
    }
  };
  Ok(concepts)
}

/// Trim, drop blanks, de-dup case-insensitively (first occurrence wins,
/// order preserved), cap at MAX_CONCEPTS.
pub fn postprocess(raw: Vec<String>) -> Vec<String> {
  let mut seen: Vec<String> = Vec::new();
  let mut out = Vec::new();
  for c in raw {
    let c = c.trim();
    if c.is_empty() {
      continue;
    }
    let key = c.to_lowercase();
    if seen.contains(&key) {
      continue;
    }
    seen.push(key);
    out.push(c.to_string());
    if out.len() == MAX_CONCEPTS {
      break;
    }
  }
  out
}

/// Offline heuristic: most frequent capitalized-ish long words, in first-seen
/// order. Crude, but it keeps the quiz loop alive without an API key.
fn local_concepts(text: &str) -> Vec<String> {
  let mut counts: Vec<(String, usize)> = Vec::new();
  for word in text.split(|c: char| !c.is_alphanumeric()) {
    if word.chars().count() < FALLBACK_MIN_WORD_LEN {
      continue;
    }
    let key = word.to_lowercase();
    match counts.iter_mut().find(|(w, _)| *w == key) {
      Some((_, n)) => *n += 1,
      None => counts.push((key, 1)),
    }
  }
  counts.sort_by(|a, b| b.1.cmp(&a.1));
  counts
    .into_iter()
    .take(MAX_CONCEPTS)
    .map(|(w, _)| {
      // Title-case the label for display.
      let mut chars = w.chars();
      match chars.next() {
        Some(f) => f.to_uppercase().collect::<String>() + chars.as_str(),
        None => w,
      }
    })
    .collect()
}
