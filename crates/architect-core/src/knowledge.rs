//! The knowledge ledger.
//!
//! Append-only and deduplicated by title. The title of a learning note is
//! the text before its first `:`. A note whose title already exists in the
//! ledger is dropped outright; the existing entry is never updated.

use architect_types::{GroundingLink, KnowledgeCategory, KnowledgeEntry, KnowledgeId};
use chrono::{DateTime, Utc};

/// Title used when a note has no usable prefix.
pub const DEFAULT_TITLE: &str = "Synthesis Logic";

/// An incoming learning note, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeCandidate {
    /// Full note text; becomes the entry description.
    pub note: String,
    /// Category for the entry.
    pub category: KnowledgeCategory,
    /// Learning iteration that produced the note.
    pub iteration: u64,
    /// Supporting citations.
    pub links: Vec<GroundingLink>,
}

/// Derive the deduplication title for a note.
pub fn derive_title(note: &str) -> String {
    let prefix = note.split(':').next().unwrap_or_default().trim();
    if prefix.is_empty() {
        DEFAULT_TITLE.to_owned()
    } else {
        prefix.to_owned()
    }
}

/// Whether the ledger already holds an entry titled `title`.
pub fn contains_title(ledger: &[KnowledgeEntry], title: &str) -> bool {
    ledger.iter().any(|entry| entry.title == title)
}

/// Append `candidate` to `ledger` unless its title is already present.
///
/// `now` stamps the new entry; nothing else about the result depends on
/// when the call happens.
pub fn append(
    mut ledger: Vec<KnowledgeEntry>,
    candidate: KnowledgeCandidate,
    now: DateTime<Utc>,
) -> Vec<KnowledgeEntry> {
    let title = derive_title(&candidate.note);
    if contains_title(&ledger, &title) {
        return ledger;
    }
    ledger.push(KnowledgeEntry {
        id: KnowledgeId::new(),
        title,
        description: candidate.note,
        category: candidate.category,
        iteration: candidate.iteration,
        created_at: now,
        links: candidate.links,
    });
    ledger
}

/// Entries filed under `category`, in ledger order.
pub fn by_category(
    ledger: &[KnowledgeEntry],
    category: KnowledgeCategory,
) -> impl Iterator<Item = &KnowledgeEntry> {
    ledger.iter().filter(move |entry| entry.category == category)
}
