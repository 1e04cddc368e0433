//! State graph: nodes + explicit edges (from → to) + conditional edges.
//!
//! Add nodes with `add_node`, define transitions with `add_edge(from, to)` and
//! `add_conditional_edges(from, router, path_map)`, using `START` and `END` for graph
//! entry/exit, then `compile` or `compile_with_checkpointer` to get a `CompiledStateGraph`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, Transition};
use crate::graph::node::Node;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// Condition function for a conditional edge: reads the state, returns a path-map key.
pub type Router<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

enum EdgeSpec<S> {
    Direct(String, String),
    Conditional {
        from: String,
        router: Router<S>,
        path_map: HashMap<String, String>,
    },
}

impl<S> EdgeSpec<S> {
    fn from_id(&self) -> &str {
        match self {
            EdgeSpec::Direct(from, _) => from,
            EdgeSpec::Conditional { from, .. } => from,
        }
    }
}

/// State graph: nodes plus explicit edges.
///
/// Generic over state type `S`. Each node has at most one outgoing edge, either direct or
/// conditional; cycles are allowed (e.g. `invoke_tool → chat`).
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<EdgeSpec<S>>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Adds a node; replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push(EdgeSpec::Direct(from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional edge: after `from_id` runs, `router(&state)` picks a key of
    /// `path_map` and the graph moves to the mapped node (or `END`).
    ///
    /// An unmapped key at run time is an execution error.
    pub fn add_conditional_edges<I, K, V>(
        &mut self,
        from_id: impl Into<String>,
        router: Router<S>,
        path_map: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.edges.push(EdgeSpec::Conditional {
            from: from_id.into(),
            router,
            path_map: path_map
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        });
        self
    }

    /// Builds the executable graph without persistence.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph with a checkpointer. When `invoke(state, config)` is called with
    /// `config.thread_id`, the final state is saved after the run.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer))
    }

    fn check_target(&self, id: &str) -> Result<(), CompilationError> {
        if id != END && !self.nodes.contains_key(id) {
            return Err(CompilationError::NodeNotFound(id.to_string()));
        }
        Ok(())
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let mut seen_from = HashSet::new();
        let mut entry = None;
        let mut reaches_end = false;

        for edge in &self.edges {
            let from = edge.from_id();
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.to_string()));
            }
            if !seen_from.insert(from.to_string()) {
                return Err(if from == START {
                    CompilationError::MissingStart
                } else {
                    CompilationError::DuplicateEdge(from.to_string())
                });
            }
            match edge {
                EdgeSpec::Direct(from, to) => {
                    self.check_target(to)?;
                    reaches_end |= to == END;
                    if from == START {
                        entry = Some(to.clone());
                    }
                }
                EdgeSpec::Conditional { from, path_map, .. } => {
                    if from == START {
                        return Err(CompilationError::MissingStart);
                    }
                    if path_map.is_empty() {
                        return Err(CompilationError::EmptyPathMap(from.clone()));
                    }
                    for to in path_map.values() {
                        self.check_target(to)?;
                        reaches_end |= to == END;
                    }
                }
            }
        }

        let entry = match entry {
            Some(id) if id != END => id,
            _ => return Err(CompilationError::MissingStart),
        };
        if !reaches_end {
            return Err(CompilationError::MissingEnd);
        }

        let transitions = self
            .edges
            .into_iter()
            .filter(|e| e.from_id() != START)
            .map(|e| match e {
                EdgeSpec::Direct(from, to) => (from, Transition::Direct(to)),
                EdgeSpec::Conditional {
                    from,
                    router,
                    path_map,
                } => (from, Transition::Conditional { router, path_map }),
            })
            .collect();

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            transitions,
            checkpointer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::graph::Next;

    struct Noop(&'static str);

    #[async_trait]
    impl Node<i32> for Noop {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            Ok((state, Next::Continue))
        }
    }

    fn with_nodes(ids: &[&'static str]) -> StateGraph<i32> {
        let mut g = StateGraph::new();
        for id in ids {
            g.add_node(*id, Arc::new(Noop(id)));
        }
        g
    }

    /// **Scenario**: Edge to an unregistered node fails with NodeNotFound.
    #[test]
    fn compile_unknown_node_fails() {
        let mut g = with_nodes(&["a"]);
        g.add_edge(START, "a").add_edge("a", "b");
        assert_eq!(
            g.compile().err(),
            Some(CompilationError::NodeNotFound("b".into()))
        );
    }

    /// **Scenario**: No START edge fails with MissingStart.
    #[test]
    fn compile_without_start_fails() {
        let mut g = with_nodes(&["a"]);
        g.add_edge("a", END);
        assert_eq!(g.compile().err(), Some(CompilationError::MissingStart));
    }

    /// **Scenario**: Graph with no path to END fails with MissingEnd.
    #[test]
    fn compile_without_end_fails() {
        let mut g = with_nodes(&["a", "b"]);
        g.add_edge(START, "a").add_edge("a", "b").add_edge("b", "a");
        assert_eq!(g.compile().err(), Some(CompilationError::MissingEnd));
    }

    /// **Scenario**: A node with both a direct and a conditional edge fails with DuplicateEdge.
    #[test]
    fn compile_duplicate_outgoing_fails() {
        let mut g = with_nodes(&["a"]);
        g.add_edge(START, "a").add_edge("a", END);
        g.add_conditional_edges("a", Arc::new(|_: &i32| "x".to_string()), [("x", END)]);
        assert_eq!(
            g.compile().err(),
            Some(CompilationError::DuplicateEdge("a".into()))
        );
    }

    /// **Scenario**: A conditional path map pointing at an unknown node fails at compile time.
    #[test]
    fn compile_conditional_unknown_target_fails() {
        let mut g = with_nodes(&["a"]);
        g.add_edge(START, "a");
        g.add_conditional_edges(
            "a",
            Arc::new(|_: &i32| "x".to_string()),
            [("x", "missing"), ("y", END)],
        );
        assert_eq!(
            g.compile().err(),
            Some(CompilationError::NodeNotFound("missing".into()))
        );
    }

    /// **Scenario**: Cycle with a conditional exit compiles.
    #[test]
    fn compile_cycle_with_conditional_exit_ok() {
        let mut g = with_nodes(&["chat", "route", "tool"]);
        g.add_edge(START, "chat").add_edge("chat", "route");
        g.add_conditional_edges(
            "route",
            Arc::new(|_: &i32| "end".to_string()),
            [("tool", "tool"), ("end", END)],
        );
        g.add_edge("tool", "chat");
        assert!(g.compile().is_ok());
    }
}
