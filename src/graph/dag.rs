// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! DAG (Directed Acyclic Graph) builder for task dependencies
//!
//! Builds and validates the dependency graph of a [`TaskGraph`], rejecting
//! references to unregistered tasks and cycles.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::{TaskGraph, TaskId};
use crate::errors::AssetflowError;

/// Validated dependency graph
pub struct DagBuilder {
    graph: DiGraph<TaskId, ()>,
}

impl DagBuilder {
    /// Build a DAG from a task registry
    pub fn build(tasks: &TaskGraph) -> Result<Self, AssetflowError> {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();

        for task in tasks.tasks() {
            let node = graph.add_node(task.id);
            id_to_index.insert(task.id, node);
        }

        // Edge direction: dependency -> dependent
        for task in tasks.tasks() {
            let task_node = id_to_index[&task.id];

            for dep in task.dependency_ids() {
                let dep_node =
                    id_to_index
                        .get(&dep)
                        .ok_or_else(|| AssetflowError::UnknownDependency {
                            task: task.id.to_string(),
                            dependency: dep.to_string(),
                        })?;

                if !graph.contains_edge(*dep_node, task_node) {
                    graph.add_edge(*dep_node, task_node, ());
                }
            }
        }

        let builder = Self { graph };
        builder.validate_acyclic()?;
        Ok(builder)
    }

    fn validate_acyclic(&self) -> Result<(), AssetflowError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(AssetflowError::CircularDependency {
                tasks: self.find_cycle_members(cycle.node_id()),
            }),
        }
    }

    /// Walk back from a node known to sit on a cycle until it repeats
    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut path = vec![start];
        let mut current = start;

        loop {
            let next = self
                .graph
                .neighbors_directed(current, petgraph::Direction::Outgoing)
                .find(|n| petgraph::algo::has_path_connecting(&self.graph, *n, start, None));

            match next {
                Some(n) if n == start => {
                    path.push(n);
                    break;
                }
                Some(n) if !path.contains(&n) => {
                    path.push(n);
                    current = n;
                }
                _ => break,
            }
        }

        path.into_iter().map(|n| self.graph[n].to_string()).collect()
    }
}
