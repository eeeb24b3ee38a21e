//! Retrieval-augmented answering core.
//!
//! [`KnowledgeIndex`] embeds passages and finds them again by query;
//! [`ConversationMemory`] carries the retrieved passages to the agent.

mod index;
mod memory;

pub use index::{KnowledgeIndex, RetrievalOptions};
pub use memory::{ConversationMemory, Role, Turn};
