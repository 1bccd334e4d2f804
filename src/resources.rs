//! Resource finder: weak topics -> remedial YouTube search links.
//!
//! Pure mapping, one entry per topic. A topic that yields no usable query
//! is skipped with a warning; a partial list beats failing the response.

use tracing::{instrument, warn};

use crate::domain::Resource;

/// Build one search link per weak topic, preserving topic order.
#[instrument(level = "info", skip(weak_topics), fields(n_topics = weak_topics.len()))]
pub fn find_resources(weak_topics: &[String]) -> Vec<Resource> {
  let mut out = Vec::with_capacity(weak_topics.len());
  for topic in weak_topics {
    match resource_for_topic(topic) {
      Some(r) => out.push(r),
      None => {
        warn!(target: "tutor", topic = %topic, "Skipping topic with no derivable resource link");
      }
    }
  }
  out
}

fn resource_for_topic(topic: &str) -> Option<Resource> {
  let trimmed = topic.trim();
  if trimmed.is_empty() {
    return None;
  }
  let query = urlencoding::encode(&format!("{} tutorial", trimmed)).into_owned();
  Some(Resource {
    topic: topic.to_string(),
    url: format!("https://www.youtube.com/results?search_query={}", query),
    title: format!("Review: {}", trimmed),
  })
}
