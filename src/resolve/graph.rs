// src/resolve/graph.rs

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;

use super::workspace::WorkspaceProject;

/// Dependency graph between discovered workspace projects.
///
/// Nodes are indices into the project list it was built from.
/// Edge direction: dependency -> dependent. For a project `web` that lists
/// `api` in its dependencies we add edge `api -> web`, so walking outgoing
/// edges from a project visits everything affected by changing it.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraphMap<usize, ()>,
}

impl DependencyGraph {
    /// Build the graph. A dependency matches a project when it equals that
    /// project's package name or, failing that, its directory name.
    pub fn build(projects: &[WorkspaceProject], include_dev: bool) -> Self {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (idx, project) in projects.iter().enumerate() {
            by_name.entry(project.dir_name.as_str()).or_insert(idx);
        }
        // Package names win over directory names.
        for (idx, project) in projects.iter().enumerate() {
            if !project.manifest.name.is_empty() {
                by_name.insert(project.manifest.name.as_str(), idx);
            }
        }

        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for idx in 0..projects.len() {
            graph.add_node(idx);
        }

        for (idx, project) in projects.iter().enumerate() {
            for dep in project.manifest.dependency_names(include_dev) {
                match by_name.get(dep) {
                    Some(&dep_idx) if dep_idx != idx => {
                        graph.add_edge(dep_idx, idx, ());
                    }
                    _ => {}
                }
            }
        }

        Self { graph }
    }

    /// Projects that list `idx` directly.
    pub fn direct_dependents(&self, idx: usize) -> Vec<usize> {
        if !self.graph.contains_node(idx) {
            return Vec::new();
        }
        self.graph.neighbors(idx).collect()
    }

    /// Every project that depends on `idx`, directly or transitively, in
    /// breadth-first discovery order. Never contains `idx` itself, even when
    /// the graph has a cycle back to it.
    pub fn transitive_dependents(&self, idx: usize) -> Vec<usize> {
        if !self.graph.contains_node(idx) {
            return Vec::new();
        }
        let mut bfs = Bfs::new(&self.graph, idx);
        let mut out = Vec::new();
        while let Some(node) = bfs.next(&self.graph) {
            if node != idx {
                out.push(node);
            }
        }
        out
    }
}
