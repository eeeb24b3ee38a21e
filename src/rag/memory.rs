//! Per-query conversation memory.

use std::fmt;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Assistant,
    System,
}

impl Role {
    /// Prefix used when the history is rendered into a prompt.
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Assistant => "AI",
            Role::System => "System",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered turn buffer, scoped to a single query and never persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    /// Copy of the full history in append order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render as `Role: content` lines, one turn per line.
    pub fn buffer_string(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_memory_is_empty() {
        let memory = ConversationMemory::new();
        assert!(memory.is_empty());
        assert!(memory.snapshot().is_empty());
        assert_eq!(memory.buffer_string(), "");
    }

    #[test]
    fn test_append_keeps_order() {
        let mut memory = ConversationMemory::new();
        memory.append(Role::Assistant, "first passage");
        memory.append(Role::Assistant, "second passage");
        memory.append(Role::Human, "what was said?");

        let turns = memory.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "first passage");
        assert_eq!(turns[1].content, "second passage");
        assert_eq!(turns[2].role, Role::Human);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut memory = ConversationMemory::new();
        memory.append(Role::Assistant, "a");
        let first = memory.snapshot();
        let second = memory.snapshot();
        assert_eq!(first, second);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_buffer_string() {
        let mut memory = ConversationMemory::new();
        memory.append(Role::Human, "hi");
        memory.append(Role::Assistant, "hello");
        assert_eq!(memory.buffer_string(), "Human: hi\nAI: hello");
    }
}
