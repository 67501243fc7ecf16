//! Depth-first walk of a forest into display rows.
//!
//! Every presentation (plain text, the TUI list, JSON) consumes the same
//! `TreeRow`s so connectors and ordering stay identical across them.

use std::collections::HashSet;
use std::rc::Rc;

use serde::Serialize;

use crate::model::{Priority, TaskStatus};
use crate::tree::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphStyle {
    #[default]
    Unicode,
    Ascii,
}

/// Branch connector pieces, each four columns wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub middle: &'static str,
    pub last: &'static str,
    pub pipe: &'static str,
    pub blank: &'static str,
}

impl GlyphStyle {
    pub fn glyphs(self) -> Glyphs {
        match self {
            Self::Unicode => Glyphs {
                middle: "├── ",
                last: "└── ",
                pipe: "│   ",
                blank: "    ",
            },
            Self::Ascii => Glyphs {
                middle: "|-- ",
                last: "`-- ",
                pipe: "|   ",
                blank: "    ",
            },
        }
    }
}

/// A flattened tree row for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub depth: usize,
    /// Inherited branch segments followed by this row's connector.
    pub prefix: String,
    pub is_last: bool,
    pub has_children: bool,
    pub collapsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump_target: Option<String>,
}

impl TreeRow {
    /// Invoke `on_jump` with this row's task id if the row offers a jump.
    /// Returns whether the hook ran.
    pub fn activate_jump<F: FnMut(&str)>(&self, mut on_jump: F) -> bool {
        match &self.jump_target {
            Some(id) => {
                on_jump(id);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeRenderer<'c> {
    style: GlyphStyle,
    collapsed: Option<&'c HashSet<String>>,
    jumpable: bool,
}

impl<'c> TreeRenderer<'c> {
    pub fn new(style: GlyphStyle) -> Self {
        Self {
            style,
            collapsed: None,
            jumpable: false,
        }
    }

    /// Hide the children of every task id in `collapsed`.
    pub fn with_collapsed(mut self, collapsed: &'c HashSet<String>) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    /// Attach a jump target to every row.
    pub fn with_jump(mut self) -> Self {
        self.jumpable = true;
        self
    }

    /// Depth-first preorder over `roots`. Uses an explicit stack, so the
    /// forest may be arbitrarily deep.
    pub fn render(&self, roots: &[TreeNode<'_>]) -> Vec<TreeRow> {
        let glyphs = self.style.glyphs();
        let mut rows = Vec::new();
        // (node, prefix inherited from the parent, is_last, depth)
        let mut stack: Vec<(&TreeNode<'_>, Rc<str>, bool, usize)> = Vec::new();
        let top: Rc<str> = Rc::from("");
        push_siblings(&mut stack, roots, &top, 0);

        while let Some((node, inherited, is_last, depth)) = stack.pop() {
            let (connector, extension) = match (depth, is_last) {
                (0, _) => ("", ""),
                (_, true) => (glyphs.last, glyphs.blank),
                (_, false) => (glyphs.middle, glyphs.pipe),
            };
            let task = node.task;
            let has_children = !node.children.is_empty();
            let collapsed = has_children
                && self
                    .collapsed
                    .is_some_and(|set| set.contains(task.id.as_str()));

            rows.push(TreeRow {
                task_id: task.id.clone(),
                title: task.title.clone(),
                status: task.status,
                priority: task.priority,
                depth,
                prefix: format!("{inherited}{connector}"),
                is_last,
                has_children,
                collapsed,
                jump_target: self.jumpable.then(|| task.id.clone()),
            });

            if has_children && !collapsed {
                let child_prefix: Rc<str> = Rc::from(format!("{inherited}{extension}"));
                push_siblings(&mut stack, &node.children, &child_prefix, depth + 1);
            }
        }
        rows
    }
}

/// Queue `siblings` so the first one is popped first.
fn push_siblings<'n, 'a>(
    stack: &mut Vec<(&'n TreeNode<'a>, Rc<str>, bool, usize)>,
    siblings: &'n [TreeNode<'a>],
    inherited: &Rc<str>,
    depth: usize,
) {
    let last = siblings.len().saturating_sub(1);
    for (i, node) in siblings.iter().enumerate().rev() {
        stack.push((node, Rc::clone(inherited), i == last, depth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use crate::tree::build_tree;

    fn task(id: &str, parent: Option<&str>) -> Task {
        Task::new(id, parent)
    }

    fn prefixes(rows: &[TreeRow]) -> Vec<(&str, &str)> {
        rows.iter()
            .map(|r| (r.task_id.as_str(), r.prefix.as_str()))
            .collect()
    }

    #[test]
    fn dangling_parent_example() {
        let tasks = vec![
            task("A", None),
            task("B", Some("A")),
            task("C", Some("A")),
            task("D", Some("Z")),
        ];
        let forest = build_tree(&tasks);
        let rows = TreeRenderer::new(GlyphStyle::Unicode).render(&forest);
        assert_eq!(
            prefixes(&rows),
            vec![("A", ""), ("B", "├── "), ("C", "└── "), ("D", "")]
        );
        assert!(rows[0].has_children);
        assert!(rows[3].is_last);
    }

    #[test]
    fn nested_prefixes_carry_continuation() {
        let tasks = vec![
            task("root", None),
            task("a", Some("root")),
            task("a1", Some("a")),
            task("a2", Some("a")),
            task("b", Some("root")),
            task("b1", Some("b")),
        ];
        let forest = build_tree(&tasks);
        let rows = TreeRenderer::new(GlyphStyle::Unicode).render(&forest);
        assert_eq!(
            prefixes(&rows),
            vec![
                ("root", ""),
                ("a", "├── "),
                ("a1", "│   ├── "),
                ("a2", "│   └── "),
                ("b", "└── "),
                ("b1", "    └── "),
            ]
        );
    }

    #[test]
    fn ascii_glyphs() {
        let tasks = vec![task("r", None), task("x", Some("r")), task("y", Some("r"))];
        let forest = build_tree(&tasks);
        let rows = TreeRenderer::new(GlyphStyle::Ascii).render(&forest);
        assert_eq!(
            prefixes(&rows),
            vec![("r", ""), ("x", "|-- "), ("y", "`-- ")]
        );
    }

    #[test]
    fn prefix_grows_with_depth() {
        let tasks = vec![
            task("d0", None),
            task("d1", Some("d0")),
            task("d2", Some("d1")),
            task("d3", Some("d2")),
        ];
        let forest = build_tree(&tasks);
        let rows = TreeRenderer::new(GlyphStyle::Unicode).render(&forest);
        let widths: Vec<usize> = rows.iter().map(|r| r.prefix.chars().count()).collect();
        assert_eq!(widths, vec![0, 4, 8, 12]);
        for (depth, row) in rows.iter().enumerate() {
            assert_eq!(row.depth, depth);
        }
    }

    #[test]
    fn last_glyph_once_per_sibling_group() {
        let tasks = vec![
            task("p", None),
            task("c1", Some("p")),
            task("c2", Some("p")),
            task("c3", Some("p")),
        ];
        let forest = build_tree(&tasks);
        let rows = TreeRenderer::new(GlyphStyle::Unicode).render(&forest);
        let children: Vec<&TreeRow> = rows.iter().filter(|r| r.depth == 1).collect();
        let lasts = children.iter().filter(|r| r.prefix.ends_with("└── ")).count();
        assert_eq!(lasts, 1);
        assert!(children[2].is_last);
        assert!(children[2].prefix.ends_with("└── "));
    }

    #[test]
    fn collapsed_node_hides_children() {
        let tasks = vec![task("p", None), task("c", Some("p")), task("q", None)];
        let forest = build_tree(&tasks);
        let mut collapsed = HashSet::new();
        collapsed.insert("p".to_string());
        let rows = TreeRenderer::new(GlyphStyle::Unicode)
            .with_collapsed(&collapsed)
            .render(&forest);
        let ids: Vec<&str> = rows.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, vec!["p", "q"]);
        assert!(rows[0].collapsed);
        assert!(rows[0].has_children);
    }

    #[test]
    fn collapsing_a_leaf_is_ignored() {
        let tasks = vec![task("leaf", None)];
        let forest = build_tree(&tasks);
        let mut collapsed = HashSet::new();
        collapsed.insert("leaf".to_string());
        let rows = TreeRenderer::new(GlyphStyle::Unicode)
            .with_collapsed(&collapsed)
            .render(&forest);
        assert!(!rows[0].collapsed);
    }

    #[test]
    fn jump_hook_fires_only_when_enabled() {
        let tasks = vec![task("t", None)];
        let forest = build_tree(&tasks);

        let plain = TreeRenderer::new(GlyphStyle::Unicode).render(&forest);
        let mut jumped = Vec::new();
        assert!(!plain[0].activate_jump(|id| jumped.push(id.to_string())));
        assert!(jumped.is_empty());

        let rows = TreeRenderer::new(GlyphStyle::Unicode)
            .with_jump()
            .render(&forest);
        assert!(rows[0].activate_jump(|id| jumped.push(id.to_string())));
        assert_eq!(jumped, vec!["t"]);
    }

    #[test]
    fn empty_forest_renders_nothing() {
        assert!(TreeRenderer::new(GlyphStyle::Ascii).render(&[]).is_empty());
    }

    #[test]
    fn deep_chain_renders_on_a_small_stack() {
        let tasks: Vec<Task> = (0..2_000usize)
            .map(|i| {
                let parent = i.checked_sub(1).map(|p| format!("n{p}"));
                Task::new(format!("n{i}"), parent.as_deref())
            })
            .collect();
        let rows = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let forest = build_tree(&tasks);
                TreeRenderer::new(GlyphStyle::Ascii).render(&forest)
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(rows.len(), 2_000);
        let last = rows.last().unwrap();
        assert_eq!(last.depth, 1_999);
        assert_eq!(last.prefix.len(), 4 * 1_999);
        assert!(last.prefix.ends_with("`-- "));
    }
}
