//! Built-in tool implementations for toolrun.
//!
//! Tools give a run the ability to act beyond text: read the clock,
//! evaluate arithmetic, query the session's private database, search the
//! knowledge corpus, and translate.

pub mod calculator;
pub mod current_time;
pub mod db_query;
pub mod retrieval;
pub mod translate;

use std::path::PathBuf;
use std::sync::Arc;

use toolrun_core::{Engine, ToolRegistry};

pub use retrieval::{KeywordIndex, RetrievalService, RetrievedChunk};

/// Create a registry with every built-in tool wired for one session.
///
/// `db_path` is the session's provisioned working copy; when the session
/// has no database the db_query tool is simply not registered.
pub fn builtin_registry(
    engine: Arc<dyn Engine>,
    retrieval: Arc<dyn RetrievalService>,
    db_path: Option<PathBuf>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(current_time::CurrentTimeTool));
    registry.register(Box::new(calculator::CalculatorTool));
    registry.register(Box::new(retrieval::RetrievalTool::new(retrieval)));
    registry.register(Box::new(translate::TranslateTool::new(engine)));
    if let Some(path) = db_path {
        registry.register(Box::new(db_query::DbQueryTool::new(path)));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use toolrun_core::{EngineDecision, EngineError, EngineMessage, ToolSpec};

    struct NullEngine;

    #[async_trait]
    impl Engine for NullEngine {
        fn name(&self) -> &str {
            "null"
        }
        async fn decide(
            &self,
            _messages: &[EngineMessage],
            _tools: &[ToolSpec],
        ) -> Result<EngineDecision, EngineError> {
            Ok(EngineDecision::Final { text: String::new() })
        }
    }

    #[test]
    fn registry_without_database() {
        let registry = builtin_registry(
            Arc::new(NullEngine),
            Arc::new(KeywordIndex::new(Vec::new())),
            None,
        );
        assert_eq!(
            registry.names(),
            vec!["calculator", "current_time", "retrieval", "translate"]
        );
    }

    #[test]
    fn registry_with_database() {
        let registry = builtin_registry(
            Arc::new(NullEngine),
            Arc::new(KeywordIndex::new(Vec::new())),
            Some(PathBuf::from("/tmp/session.db")),
        );
        assert!(registry.get("db_query").is_some());
        assert_eq!(registry.len(), 5);
    }
}
