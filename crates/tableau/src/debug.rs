//! Tree dumps of the sources in a session.
//!
//! ```
//! use tableau::debug::{SourceTreeDebug, TreeStyle};
//! use tableau::source::{ListSource, SourceArena};
//! use tableau::ValueList;
//!
//! let mut arena = SourceArena::new();
//! let root = arena.insert(ListSource::new("Fruit", ["apple"].into_iter().collect::<ValueList>()), None);
//! arena.insert(ListSource::new("Seeds", ValueList::new()), Some(root));
//!
//! let dump = SourceTreeDebug::new(&arena).style(TreeStyle::Ascii).to_string();
//! assert!(dump.contains("Fruit"));
//! assert!(dump.contains("`-- Seeds"));
//! ```

use std::fmt::{self, Write};

use crate::source::{Source, SourceArena, SourceId};

/// Characters used to draw branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters.
    Ascii,
    /// Box-drawing characters.
    #[default]
    Unicode,
    /// Dashes only.
    Compact,
}

/// Renders a [`SourceArena`] as an indented tree.
#[derive(Debug, Clone, Copy)]
pub struct SourceTreeDebug<'a> {
    arena: &'a SourceArena,
    style: TreeStyle,
    show_ids: bool,
    max_depth: Option<usize>,
}

impl<'a> SourceTreeDebug<'a> {
    /// A dump of every root in `arena`.
    pub fn new(arena: &'a SourceArena) -> Self {
        Self {
            arena,
            style: TreeStyle::default(),
            show_ids: true,
            max_depth: None,
        }
    }

    /// Branch style.
    pub fn style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Omit source ids.
    pub fn hide_ids(mut self) -> Self {
        self.show_ids = false;
        self
    }

    /// Stop below `depth`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Render the subtree under `root`.
    pub fn format_subtree(&self, root: SourceId) -> String {
        let mut output = String::new();
        self.format_into(root, 0, true, &mut output);
        output
    }

    fn format_into(&self, id: SourceId, depth: usize, is_last: bool, output: &mut String) {
        if self.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(node) = self.arena.node(id) else {
            return;
        };

        output.push_str(&self.prefix(depth, is_last));
        let caption = node.source.caption();
        output.push_str(if caption.is_empty() { "(untitled)" } else { caption });
        if self.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        let _ = describe(&node.source, output);
        output.push('\n');

        let children = node.children();
        for (i, child) in children.iter().enumerate() {
            self.format_into(*child, depth + 1, i + 1 == children.len(), output);
        }
    }

    fn prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, corner, last) = match self.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };
        let mut prefix = String::new();
        for _ in 0..depth - 1 {
            prefix.push_str(branch);
            prefix.push_str("  ");
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix
    }
}

fn describe(source: &Source, output: &mut String) -> fmt::Result {
    match source {
        Source::View(view) => write!(output, " (view: {} sections)", view.sections.len()),
        Source::List(list) => {
            write!(output, " (list: {} rows", list.row_count())?;
            if list.is_multiselect() {
                write!(output, ", {} selected", list.selected_items().len())?;
            } else if !list.selected_item().is_none() {
                write!(output, ", selected {}", list.selected_item())?;
            }
            output.write_char(')')
        }
    }
}

impl fmt::Display for SourceTreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source tree ({} sources):", self.arena.len())?;
        let roots = self.arena.roots();
        if roots.is_empty() {
            return writeln!(f, "  (empty)");
        }
        for root in roots {
            f.write_str(&self.format_subtree(root))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ListSource;
    use crate::value::ValueList;

    #[test]
    fn test_empty_arena() {
        let arena = SourceArena::new();
        assert_eq!(
            SourceTreeDebug::new(&arena).to_string(),
            "Source tree (0 sources):\n  (empty)\n"
        );
    }

    #[test]
    fn test_nested_ascii() {
        let mut arena = SourceArena::new();
        let root = arena.insert(ListSource::new("Groups", ValueList::new()), None);
        let a = arena.insert(ListSource::new("A", ValueList::new()), Some(root));
        arena.insert(ListSource::new("B", ValueList::new()), Some(root));
        arena.insert(ListSource::new("A1", ValueList::new()), Some(a));

        let dump = SourceTreeDebug::new(&arena)
            .style(TreeStyle::Ascii)
            .hide_ids()
            .format_subtree(root);
        assert_eq!(
            dump,
            "Groups (list: 0 rows)\n+-- A (list: 0 rows)\n|  `-- A1 (list: 0 rows)\n`-- B (list: 0 rows)\n"
        );
    }

    #[test]
    fn test_max_depth() {
        let mut arena = SourceArena::new();
        let root = arena.insert(ListSource::new("Root", ValueList::new()), None);
        arena.insert(ListSource::new("Child", ValueList::new()), Some(root));
        let dump = SourceTreeDebug::new(&arena).hide_ids().max_depth(0).format_subtree(root);
        assert_eq!(dump, "Root (list: 0 rows)\n");
    }
}
