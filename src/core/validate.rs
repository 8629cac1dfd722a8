//! Manifest validation.
//!
//! Validation runs in two phases. Shape checks accumulate every problem into
//! one issue list. Cycle detection then runs over the module reference graph
//! whenever the module list is present. All issues are returned together.
//!
//! The graph has one node per module. Module `A` has an edge to module `B`
//! when one of `A`'s dependents declares `B`'s module path, i.e. `B` consumes
//! `A`. Dependents whose module path is not tracked by the manifest add no
//! edges.

use std::collections::{HashMap, HashSet};
use std::fmt;

use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::core::manifest::{Manifest, Module, SCHEMA_VERSION};

/// Every problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[diagnostic(
    code(modfleet::manifest::invalid),
    help("Fix the listed issues and run `modfleet validate` again")
)]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest is invalid ({} issue", self.issues.len())?;
        if self.issues.len() != 1 {
            write!(f, "s")?;
        }
        write!(f, ")")?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Validate a manifest, reporting every issue at once.
pub fn validate(manifest: &Manifest) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    check_shape(manifest, &mut issues);

    if let Some(ref modules) = manifest.modules {
        issues.extend(detect_cycles(modules));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn check_shape(manifest: &Manifest, issues: &mut Vec<String>) {
    if manifest.version != SCHEMA_VERSION {
        issues.push(format!(
            "unsupported manifest version {} (expected {})",
            manifest.version, SCHEMA_VERSION
        ));
    }

    let Some(ref modules) = manifest.modules else {
        issues.push("manifest has no `modules` section".to_string());
        return;
    };

    let mut names = HashSet::new();
    let mut paths: HashMap<&str, &str> = HashMap::new();

    for (idx, module) in modules.iter().enumerate() {
        let label = if module.name.trim().is_empty() {
            format!("modules[{}]", idx)
        } else {
            format!("module `{}`", module.name)
        };

        if module.name.trim().is_empty() {
            issues.push(format!("{}: `name` is required", label));
        } else if !names.insert(module.name.as_str()) {
            issues.push(format!("duplicate module name `{}`", module.name));
        }

        if module.module.trim().is_empty() {
            issues.push(format!("{}: `module` is required", label));
        } else if let Some(previous) = paths.insert(module.module.as_str(), module.name.as_str()) {
            issues.push(format!(
                "{}: module path `{}` is already declared by module `{}`",
                label, module.module, previous
            ));
        }

        if module.repo.trim().is_empty() {
            issues.push(format!("{}: `repo` is required", label));
        }

        check_dependents(module, &label, issues);
    }
}

fn check_dependents(module: &Module, label: &str, issues: &mut Vec<String>) {
    let mut repos = HashSet::new();

    for (idx, dependent) in module.dependents.iter().enumerate() {
        if dependent.repo.trim().is_empty() {
            issues.push(format!("{}: dependents[{}]: `repo` is required", label, idx));
        } else if !repos.insert(dependent.repo.as_str()) {
            issues.push(format!(
                "{}: duplicate dependent repository `{}`",
                label, dependent.repo
            ));
        }

        if dependent.module.trim().is_empty() {
            issues.push(format!("{}: dependents[{}]: `module` is required", label, idx));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Find cycles in the module reference graph.
///
/// Each back edge found by an iterative depth-first traversal yields one
/// issue naming the chain, e.g. `dependency cycle: a -> b -> a`.
pub fn detect_cycles(modules: &[Module]) -> Vec<String> {
    let graph = module_graph(modules);
    let mut color = vec![Color::Unvisited; graph.node_count()];
    let mut issues = Vec::new();

    for start in graph.node_indices() {
        if color[start.index()] != Color::Unvisited {
            continue;
        }

        // (node, remaining successors) plus the current path for reporting.
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = Vec::new();
        let mut path: Vec<NodeIndex> = Vec::new();

        color[start.index()] = Color::InProgress;
        stack.push((start, successors(&graph, start)));
        path.push(start);

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.pop() else {
                color[node.index()] = Color::Done;
                stack.pop();
                path.pop();
                continue;
            };

            match color[next.index()] {
                Color::Unvisited => {
                    color[next.index()] = Color::InProgress;
                    stack.push((next, successors(&graph, next)));
                    path.push(next);
                }
                Color::InProgress => {
                    let from = path.iter().position(|&n| n == next).unwrap_or(0);
                    let chain: Vec<&str> = path[from..]
                        .iter()
                        .chain(std::iter::once(&next))
                        .map(|&n| graph[n])
                        .collect();
                    issues.push(format!("dependency cycle: {}", chain.join(" -> ")));
                }
                Color::Done => {}
            }
        }
    }

    issues
}

/// Successors ordered so that popping visits them in declaration order.
fn successors(graph: &DiGraph<&str, ()>, node: NodeIndex) -> Vec<NodeIndex> {
    // petgraph yields neighbors most recent edge first.
    graph.neighbors(node).collect()
}

fn module_graph(modules: &[Module]) -> DiGraph<&str, ()> {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = modules
        .iter()
        .map(|m| graph.add_node(m.name.as_str()))
        .collect();

    // First declaration wins; duplicates are reported by the shape checks.
    let mut by_path: HashMap<&str, NodeIndex> = HashMap::new();
    for (module, &node) in modules.iter().zip(&nodes) {
        by_path.entry(module.module.as_str()).or_insert(node);
    }

    for (module, &from) in modules.iter().zip(&nodes) {
        for dependent in &module.dependents {
            if let Some(&to) = by_path.get(dependent.module.as_str()) {
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    graph
}
