//! Forest construction from a flat task snapshot.
//!
//! Tasks whose parents aren't in the snapshot (or point at themselves) are
//! promoted to root level. Sibling and root order follow the input order.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::Task;

/// A task plus its direct children, borrowed from the snapshot it was built from.
///
/// Walks over a node never recurse, so parent chains of any length are fine.
/// Serializing is the exception: serde nests one call per level.
#[derive(Debug, Serialize)]
pub struct TreeNode<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub children: Vec<TreeNode<'a>>,
}

impl<'a> TreeNode<'a> {
    pub fn id(&self) -> &'a str {
        &self.task.id
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        walk(std::slice::from_ref(self)).count()
    }

    /// Height of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        walk(std::slice::from_ref(self))
            .map(|(_, depth)| depth + 1)
            .max()
            .unwrap_or(1)
    }
}

// The derived drop would recurse once per level.
impl Drop for TreeNode<'_> {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Depth-first preorder over a forest, yielding each node with its depth
/// (roots are depth 0).
pub struct Walk<'n, 'a> {
    stack: Vec<(&'n TreeNode<'a>, usize)>,
}

impl<'n, 'a> Iterator for Walk<'n, 'a> {
    type Item = (&'n TreeNode<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

pub fn walk<'n, 'a>(nodes: &'n [TreeNode<'a>]) -> Walk<'n, 'a> {
    Walk {
        stack: nodes.iter().rev().map(|node| (node, 0)).collect(),
    }
}

/// Build a forest from `tasks`.
///
/// Runs in two passes: index every task by id, then link each task to its
/// parent in input order. A child may precede its parent in the input.
/// Tasks left unreachable from any root sit on or under a parent cycle; the
/// cycle member that comes first in the input is promoted to root so every
/// task still appears exactly once.
pub fn build_tree(tasks: &[Task]) -> Vec<TreeNode<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        index.entry(task.id.as_str()).or_insert(i);
    }

    let mut parent_of: Vec<Option<usize>> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            task.parent_id
                .as_deref()
                .and_then(|p| index.get(p).copied())
                .filter(|&p| p != i)
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(p) = *parent {
            children[p].push(i);
        }
    }

    let mut reachable = vec![false; tasks.len()];
    for i in 0..tasks.len() {
        if parent_of[i].is_none() {
            mark_reachable(i, &children, &mut reachable);
        }
    }

    for i in 0..tasks.len() {
        while !reachable[i] {
            let head = cycle_head(&parent_of, i);
            if let Some(old_parent) = parent_of[head].take() {
                children[old_parent].retain(|&c| c != head);
            }
            tracing::warn!(task = %tasks[head].id, "parent cycle; promoting task to root");
            mark_reachable(head, &children, &mut reachable);
        }
    }

    let roots: Vec<usize> = (0..tasks.len())
        .filter(|&i| parent_of[i].is_none())
        .collect();
    assemble(&roots, tasks, &children)
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reachable: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if !reachable[i] {
            reachable[i] = true;
            stack.extend(children[i].iter().copied());
        }
    }
}

/// Walk up from `start` until the parent chain repeats, then return the
/// member of that cycle with the lowest input index.
fn cycle_head(parent_of: &[Option<usize>], start: usize) -> usize {
    let mut seen = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match parent_of[current] {
            Some(p) => current = p,
            None => return current,
        }
    }

    let entry = current;
    let mut head = entry;
    let mut walk = parent_of[entry];
    while let Some(p) = walk {
        if p == entry {
            break;
        }
        head = head.min(p);
        walk = parent_of[p];
    }
    head
}

/// Build the nodes bottom-up: a preorder lists every parent before its
/// children, so walking it backwards finishes each child before its parent.
fn assemble<'a>(roots: &[usize], tasks: &'a [Task], children: &[Vec<usize>]) -> Vec<TreeNode<'a>> {
    let mut order = Vec::with_capacity(tasks.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }

    let mut built: Vec<Option<TreeNode<'a>>> = (0..tasks.len()).map(|_| None).collect();
    for &i in order.iter().rev() {
        let kids = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(TreeNode {
            task: &tasks[i],
            children: kids,
        });
    }
    roots.iter().filter_map(|&r| built[r].take()).collect()
}

/// Total number of nodes in a forest.
pub fn count_nodes(nodes: &[TreeNode<'_>]) -> usize {
    walk(nodes).count()
}

/// Depth-first search for the node wrapping task `id`.
pub fn find<'n, 'a>(nodes: &'n [TreeNode<'a>], id: &str) -> Option<&'n TreeNode<'a>> {
    walk(nodes)
        .map(|(node, _)| node)
        .find(|node| node.task.id == id)
}

/// `tasks` reordered so each task follows its parent, with every sibling
/// group kept in input order.
pub fn preorder(tasks: &[Task]) -> Vec<Task> {
    let forest = build_tree(tasks);
    let ordered = walk(&forest).map(|(node, _)| node.task.clone()).collect();
    ordered
}

/// The task `root_id` and all of its descendants, in input order.
///
/// Returns an empty list when `root_id` isn't in the snapshot.
pub fn subtree(tasks: &[Task], root_id: &str) -> Vec<Task> {
    let forest = build_tree(tasks);
    let Some(node) = find(&forest, root_id) else {
        return Vec::new();
    };
    let keep: HashSet<&str> = walk(std::slice::from_ref(node))
        .map(|(n, _)| n.id())
        .collect();
    tasks
        .iter()
        .filter(|t| keep.contains(t.id.as_str()))
        .cloned()
        .collect()
}
