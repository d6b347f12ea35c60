//! Release-order cycle detection
//!
//! Builds a petgraph digraph whose nodes are release units (modules released on
//! their own) and whose edges point from a unit to every unit it needs released
//! first: snapshot dependencies and snapshot parents of any module in the unit.
//! Strongly connected components with more than one node are cycles that
//! would make a cascade recurse forever.

use super::module_graph::{ModuleGraph, ModuleId};
use crate::core::error::{CascadeResult, ConfigError};
use crate::project::{ProjectModel, is_snapshot};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Find cycles between release units, each rendered as sorted coordinates
pub fn find_release_cycles(graph: &ModuleGraph, model: &dyn ProjectModel) -> CascadeResult<Vec<Vec<String>>> {
  let mut digraph: DiGraph<ModuleId, ()> = DiGraph::new();
  let mut nodes: HashMap<ModuleId, NodeIndex> = HashMap::new();
  let mut node_for = |digraph: &mut DiGraph<ModuleId, ()>, id: ModuleId| {
    *nodes.entry(id).or_insert_with(|| digraph.add_node(id))
  };

  for id in graph.walk() {
    let unit = graph.release_unit(id);
    let from = node_for(&mut digraph, unit);

    let mut prerequisites = Vec::new();
    for dependency in graph.dependencies(id, model)? {
      if dependency.is_snapshot()
        && let Some(target) = graph.find(&dependency.coordinate)
      {
        prerequisites.push(target);
      }
    }
    if let Some(parent) = graph.manifest(id, model)?.parent
      && is_snapshot(&parent.version)
      && let Some(target) = graph.find(&parent.coordinate())
    {
      prerequisites.push(target);
    }

    for target in prerequisites {
      let target_unit = graph.release_unit(target);
      if target_unit == unit {
        continue;
      }
      let to = node_for(&mut digraph, target_unit);
      digraph.update_edge(from, to, ());
    }
  }

  let mut cycles: Vec<Vec<String>> = tarjan_scc(&digraph)
    .into_iter()
    .filter(|component| component.len() > 1)
    .map(|component| {
      let mut members: Vec<String> = component
        .into_iter()
        .map(|node| graph.coordinate(digraph[node]).to_string())
        .collect();
      members.sort();
      members
    })
    .collect();
  cycles.sort();
  Ok(cycles)
}

/// Fail with `ConfigError::ReleaseCycle` when any cycle exists
pub fn ensure_acyclic(graph: &ModuleGraph, model: &dyn ProjectModel) -> CascadeResult<()> {
  let cycles = find_release_cycles(graph, model)?;
  if cycles.is_empty() {
    Ok(())
  } else {
    Err(ConfigError::ReleaseCycle { cycles }.into())
  }
}
