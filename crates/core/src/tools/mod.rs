//! Capability tools: knowledge base search and CRM lookup.
//!
//! Both are injected into the pipeline behind traits so production backends
//! (network knowledge bases, real CRMs) can replace the static tables.

mod crm;
mod knowledge_base;
mod traits;

pub use crm::{CrmConfig, CustomerProfile, CustomerTier, StaticCrm};
pub use knowledge_base::{
    default_entries, KnowledgeBaseConfig, KnowledgeEntry, KnowledgeMatch, StaticKnowledgeBase,
};
pub use traits::{CustomerDirectory, KnowledgeBase, ToolError};
