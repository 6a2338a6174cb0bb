//! # Conversation model
//!
//! A conversation is an ordered sequence of role-tagged entries. Entries start
//! unprocessed and are rewritten exactly once by the cleaning pipeline; once an
//! entry is marked `processed` it is treated as immutable history.
//!
//! The JSON interchange shape is a plain array:
//!
//! ```json
//! [
//!   {"role": "user", "message": "Build me a shop", "processed": false},
//!   {"role": "tool", "message": "chunk one\n\nchunk two"}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a conversation entry
///
/// Unknown role strings are preserved as [`Role::Other`] so that foreign
/// conversations survive a round trip; they follow the identity policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Human-authored turn
    User,
    /// Model-authored turn
    Ai,
    /// System or orchestration notice
    System,
    /// Raw tool output
    Tool,
    /// Any role outside the four above
    Other(String),
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::System => "system",
            Self::Tool => "tool",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "ai" => Self::Ai,
            "system" => Self::System,
            "tool" => Self::Tool,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Author of the turn
    pub role: Role,

    /// Turn content; rewritten once when the entry is cleaned
    pub message: String,

    /// Whether the entry has already been cleaned
    #[serde(default)]
    pub processed: bool,
}

impl ConversationEntry {
    /// Create a new, unprocessed entry
    pub fn new(role: impl Into<Role>, message: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            message: message.into(),
            processed: false,
        }
    }

    /// Create an entry that is already part of processed history
    pub fn processed(role: impl Into<Role>, message: impl Into<String>) -> Self {
        Self {
            processed: true,
            ..Self::new(role, message)
        }
    }

    /// Shorthand for a user entry
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(Role::User, message)
    }

    /// Shorthand for an ai entry
    pub fn ai(message: impl Into<String>) -> Self {
        Self::new(Role::Ai, message)
    }

    /// Shorthand for a system entry
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(Role::System, message)
    }

    /// Shorthand for a tool entry
    pub fn tool(message: impl Into<String>) -> Self {
        Self::new(Role::Tool, message)
    }

    /// Copy of this entry carrying a new message, marked processed
    pub fn with_cleaned_message(&self, message: String) -> Self {
        Self {
            role: self.role.clone(),
            message,
            processed: true,
        }
    }
}

/// Ordered, chronological sequence of entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the entries in order
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Entry at `index`, if any
    pub fn get(&self, index: usize) -> Option<&ConversationEntry> {
        self.entries.get(index)
    }

    /// Iterate over entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, ConversationEntry> {
        self.entries.iter()
    }

    /// Consume into the underlying vector
    pub fn into_entries(self) -> Vec<ConversationEntry> {
        self.entries
    }

    pub(crate) fn replace(&mut self, index: usize, entry: ConversationEntry) {
        self.entries[index] = entry;
    }

    /// Index of the first user entry: the original task
    pub fn original_task_index(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.role == Role::User)
    }

    /// Start of the trailing run of unprocessed entries
    ///
    /// Scans backward from the end and stops at the first processed entry.
    /// Equals `len()` when the last entry is already processed.
    pub fn unprocessed_boundary(&self) -> usize {
        let mut boundary = self.entries.len();
        for (index, entry) in self.entries.iter().enumerate().rev() {
            if entry.processed {
                break;
            }
            boundary = index;
        }
        boundary
    }

    /// Unprocessed entries sitting before `boundary`
    pub fn out_of_order(&self, boundary: usize) -> Vec<usize> {
        self.entries
            .iter()
            .take(boundary)
            .enumerate()
            .filter(|(_, e)| !e.processed)
            .map(|(i, _)| i)
            .collect()
    }

    /// True when every entry has been cleaned
    pub fn is_fully_processed(&self) -> bool {
        self.entries.iter().all(|e| e.processed)
    }

    /// One `role: message` line per entry
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry.role.as_str());
            out.push_str(": ");
            out.push_str(&entry.message);
            out.push('\n');
        }
        out
    }
}

impl From<Vec<ConversationEntry>> for Conversation {
    fn from(entries: Vec<ConversationEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<ConversationEntry> for Conversation {
    fn from_iter<I: IntoIterator<Item = ConversationEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl std::ops::Index<usize> for Conversation {
    type Output = ConversationEntry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ConversationEntry;
    type IntoIter = std::slice::Iter<'a, ConversationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// What a cleaning pass touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    /// The original task was cleaned during this pass
    pub task_cleaned: bool,

    /// Indices rewritten by the pass, ascending (task excluded)
    pub cleaned: Vec<usize>,

    /// Subset of `cleaned` that violated the ordering invariant and was repaired
    pub repaired: Vec<usize>,
}

impl CleanReport {
    /// True when the pass changed nothing
    pub fn is_noop(&self) -> bool {
        !self.task_cleaned && self.cleaned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::from("user"), Role::User);
        assert_eq!(Role::from("ai"), Role::Ai);
        assert_eq!(Role::from("system"), Role::System);
        assert_eq!(Role::from("tool"), Role::Tool);
        assert_eq!(Role::from("critic"), Role::Other("critic".to_string()));
        assert_eq!(String::from(Role::Tool), "tool");
    }

    #[test]
    fn test_entry_json_shape() {
        let json = r#"[
            {"role": "user", "message": "hello"},
            {"role": "narrator", "message": "meanwhile", "processed": true}
        ]"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();

        assert_eq!(conversation.len(), 2);
        assert!(!conversation[0].processed);
        assert_eq!(conversation[1].role, Role::Other("narrator".to_string()));

        let back = serde_json::to_value(&conversation).unwrap();
        assert_eq!(back[1]["role"], "narrator");
        assert_eq!(back[0]["processed"], false);
    }

    #[test]
    fn test_original_task_index() {
        let conversation: Conversation = vec![
            ConversationEntry::system("setup"),
            ConversationEntry::user("first"),
            ConversationEntry::user("second"),
        ]
        .into();
        assert_eq!(conversation.original_task_index(), Some(1));

        let no_user: Conversation = vec![ConversationEntry::ai("hi")].into();
        assert_eq!(no_user.original_task_index(), None);
    }

    #[test]
    fn test_entry_access() {
        let conversation: Conversation = vec![
            ConversationEntry::user("task"),
            ConversationEntry::processed(Role::Tool, "docs"),
        ]
        .into();

        assert_eq!(conversation.get(1).map(|e| e.message.as_str()), Some("docs"));
        assert!(conversation.get(2).is_none());

        let entries = conversation.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert!(entries[1].processed);
    }

    #[test]
    fn test_unprocessed_boundary() {
        let conversation: Conversation = vec![
            ConversationEntry::processed(Role::User, "a"),
            ConversationEntry::processed(Role::Ai, "b"),
            ConversationEntry::tool("c"),
            ConversationEntry::ai("d"),
        ]
        .into();
        assert_eq!(conversation.unprocessed_boundary(), 2);
        assert!(conversation.out_of_order(2).is_empty());
    }

    #[test]
    fn test_boundary_when_everything_processed() {
        let conversation: Conversation = vec![
            ConversationEntry::processed(Role::User, "a"),
            ConversationEntry::processed(Role::Ai, "b"),
        ]
        .into();
        assert_eq!(conversation.unprocessed_boundary(), 2);
        assert!(conversation.is_fully_processed());
    }

    #[test]
    fn test_out_of_order_detection() {
        let conversation: Conversation = vec![
            ConversationEntry::system("stray"),
            ConversationEntry::processed(Role::User, "task"),
            ConversationEntry::ai("new"),
        ]
        .into();
        let boundary = conversation.unprocessed_boundary();
        assert_eq!(boundary, 2);
        assert_eq!(conversation.out_of_order(boundary), vec![0]);
    }

    #[test]
    fn test_render() {
        let conversation: Conversation = vec![
            ConversationEntry::user("hi"),
            ConversationEntry::ai("hello"),
        ]
        .into();
        assert_eq!(conversation.render(), "user: hi\nai: hello\n");
    }
}
