//! Dependency edges and their topological ordering.
//!
//! An edge `a -> b` (b in `a.dependents`) means `b` reads state `a` produces,
//! so `a` must update first. The sorter computes each component's height
//! (longest path to a leaf) and orders components by descending height, which
//! places every producer before all of its consumers.

use log::warn;

use crate::artboard::Artboard;
use crate::component::{Component, ComponentKind};
use crate::ids::ComponentId;

impl Artboard {
    /// Register the edges implied by `id`'s resolved references.
    pub(crate) fn build_dependencies(&mut self, id: ComponentId) {
        let Some(component) = self.resolve(id) else {
            return;
        };
        let parent = component.parent;
        let mut producers: Vec<ComponentId> = Vec::new();

        match &component.kind {
            ComponentKind::Artboard(_) | ComponentKind::SolidColor(_) => {}
            kind @ (ComponentKind::Node(_)
            | ComponentKind::Shape(_)
            | ComponentKind::Rectangle(_)
            | ComponentKind::Ellipse(_)
            | ComponentKind::RootBone(_)
            | ComponentKind::Bone(_)) => {
                producers.extend(parent);
                if let Some(t) = kind.transform() {
                    producers.extend(t.constraints.iter().copied());
                }
            }
            ComponentKind::PathComposer(_) => {
                if let Some(shape) = parent {
                    producers.push(shape);
                    if let Some(ComponentKind::Shape(s)) = self.resolve(shape).map(|c| &c.kind) {
                        producers.extend(s.paths.iter().copied());
                    }
                }
            }
            ComponentKind::Fill(p) | ComponentKind::Stroke(p) => {
                producers.extend(p.shape);
            }
            ComponentKind::Constraint(c) => {
                producers.push(c.target);
            }
        }

        for producer in producers {
            self.add_dependent(producer, id);
        }
        self.build_ik_dependencies(id);
    }

    /// The solve rewrites every bone in the chain while the tip updates, so
    /// anything hanging off a bone above the tip waits for the tip.
    fn build_ik_dependencies(&mut self, id: ComponentId) {
        let chain = self.ik_chain(id);
        let Some((&tip, above)) = chain.split_last() else {
            return;
        };
        let mut waiting: Vec<ComponentId> = Vec::new();
        for bone in above {
            let Some(component) = self.resolve(*bone) else {
                continue;
            };
            for child in component.children.iter().copied() {
                let is_transform = self.resolve(child).is_some_and(|c| c.kind.is_transform());
                if is_transform && !chain.contains(&child) && !waiting.contains(&child) {
                    waiting.push(child);
                }
            }
        }
        for child in waiting {
            let known = self.resolve(tip).is_some_and(|t| t.dependents.contains(&child));
            if !known {
                self.add_dependent(tip, child);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnStack,
    Done,
}

/// Iterative depth-first sort with cycle breaking.
pub(crate) struct DependencySorter {
    visit: Vec<Visit>,
    height: Vec<u32>,
}

impl DependencySorter {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            visit: vec![Visit::Unvisited; len],
            height: vec![0; len],
        }
    }

    /// Order every live component so producers precede consumers.
    ///
    /// Edges that close a cycle are removed from the producer's dependents
    /// list and logged; the remaining graph is acyclic.
    pub(crate) fn sort(&mut self, objects: &mut [Option<Component>]) -> Vec<ComponentId> {
        let len = objects.len();
        let mut back_edges: Vec<(usize, ComponentId)> = Vec::new();
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..len {
            if objects[root].is_none() || self.visit[root] != Visit::Unvisited {
                continue;
            }
            self.visit[root] = Visit::OnStack;
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let dependent = objects[node]
                    .as_ref()
                    .and_then(|c| c.dependents.get(top.1).copied());
                match dependent {
                    Some(dep) => {
                        top.1 += 1;
                        let d = dep.index();
                        if d >= len || objects[d].is_none() {
                            continue;
                        }
                        match self.visit[d] {
                            Visit::Unvisited => {
                                self.visit[d] = Visit::OnStack;
                                stack.push((d, 0));
                            }
                            Visit::OnStack => back_edges.push((node, dep)),
                            Visit::Done => {
                                self.height[node] = self.height[node].max(self.height[d] + 1);
                            }
                        }
                    }
                    None => {
                        stack.pop();
                        self.visit[node] = Visit::Done;
                        if let Some(&(parent, _)) = stack.last() {
                            self.height[parent] = self.height[parent].max(self.height[node] + 1);
                        }
                    }
                }
            }
        }

        for (producer, dependent) in back_edges {
            warn!(
                "dependency cycle: dropping edge {} -> {dependent}",
                ComponentId::from_index(producer)
            );
            if let Some(c) = objects[producer].as_mut() {
                c.dependents.retain(|d| *d != dependent);
            }
        }

        let mut order: Vec<usize> = (0..len).filter(|&i| objects[i].is_some()).collect();
        let height = &self.height;
        order.sort_by(|a, b| height[*b].cmp(&height[*a]));
        order.into_iter().map(ComponentId::from_index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKind, TransformData};

    fn graph(edges: &[(u32, u32)], n: usize) -> Vec<Option<Component>> {
        let mut objects: Vec<Option<Component>> = (0..n)
            .map(|_| Some(Component::new("", None, ComponentKind::Node(TransformData::default()))))
            .collect();
        for &(from, to) in edges {
            if let Some(c) = objects[from as usize].as_mut() {
                c.dependents.push(ComponentId(to));
            }
        }
        objects
    }

    fn position(order: &[ComponentId], id: u32) -> usize {
        order.iter().position(|c| *c == ComponentId(id)).unwrap()
    }

    #[test]
    fn producers_precede_consumers() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3, 4 -> 2
        let mut objects = graph(&[(0, 1), (1, 3), (0, 2), (2, 3), (4, 2)], 5);
        let order = DependencySorter::new(5).sort(&mut objects);
        assert_eq!(order.len(), 5);
        for (a, b) in [(0, 1), (1, 3), (0, 2), (2, 3), (4, 2)] {
            assert!(position(&order, a) < position(&order, b), "{a} before {b}");
        }
    }

    #[test]
    fn independent_components_keep_declaration_order() {
        let mut objects = graph(&[], 4);
        let order = DependencySorter::new(4).sort(&mut objects);
        assert_eq!(order, vec![ComponentId(0), ComponentId(1), ComponentId(2), ComponentId(3)]);
    }

    #[test]
    fn cycle_edge_is_dropped() {
        let mut objects = graph(&[(0, 1), (1, 2), (2, 0)], 3);
        let order = DependencySorter::new(3).sort(&mut objects);
        assert_eq!(order.len(), 3);
        // 2 -> 0 closes the cycle found from root 0
        assert!(objects[2].as_ref().unwrap().dependents.is_empty());
        assert_eq!(order, vec![ComponentId(0), ComponentId(1), ComponentId(2)]);
    }

    #[test]
    fn null_slots_are_skipped() {
        let mut objects = graph(&[(0, 2)], 3);
        objects[1] = None;
        let order = DependencySorter::new(3).sort(&mut objects);
        assert_eq!(order, vec![ComponentId(0), ComponentId(2)]);
    }
}
