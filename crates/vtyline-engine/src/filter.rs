//! The shared output filter/pipe subtree.
//!
//! Built once at grammar construction: a self-referential `|` node whose
//! clauses (`count`, `save <file>`, `include`/`exclude <pattern>`,
//! `grep <regex>`, `refresh <interval> [cls]`) loop back to `|` so clauses
//! chain arbitrarily. The engine only tracks which accepted tokens belong
//! to the clause; pattern syntax is the output-filtering subsystem's
//! business.

use vtyline_types::LeafType;

use crate::tree::{EdgeKind, Grammar, NodeId};

/// Leaf slot ids used inside filter clauses.
pub const FILTER_LEAF_FILE: u32 = 0xF1;
pub const FILTER_LEAF_PATTERN: u32 = 0xF2;
pub const FILTER_LEAF_INTERVAL: u32 = 0xF3;

/// Construct the pipe subtree; returns the shared `|` node.
///
/// Called exactly once from `Grammar::new`. Every edge that closes a cycle
/// is a `Loop` edge, including the pipe node's own self-reference.
pub(crate) fn build_pipe_subtree(g: &mut Grammar) -> NodeId {
    // Construction of the static filter grammar cannot fail: the child
    // counts are fixed and far below capacity.
    let pipe = g.make_command("|", "Filter the command output");

    let count = g.make_command("count", "Count output lines");
    let save = g.make_command("save", "Write output to a file");
    let include = g.make_command("include", "Keep lines containing a pattern");
    let exclude = g.make_command("exclude", "Drop lines containing a pattern");
    let grep = g.make_command("grep", "Keep lines matching a regex");
    let refresh = g.make_command("refresh", "Re-run the command periodically");

    let file = g.make_leaf(LeafType::String, FILTER_LEAF_FILE, "Output file name");
    let include_pat = g.make_leaf(LeafType::String, FILTER_LEAF_PATTERN, "Match pattern");
    let exclude_pat = g.make_leaf(LeafType::String, FILTER_LEAF_PATTERN, "Match pattern");
    let grep_pat = g.make_leaf(LeafType::String, FILTER_LEAF_PATTERN, "Regular expression");
    let interval = g.make_leaf(LeafType::Int, FILTER_LEAF_INTERVAL, "Interval in seconds");
    let cls = g.make_command("cls", "Clear the screen between runs");

    g.attach_edge(pipe, pipe, EdgeKind::Loop);
    for clause in [count, save, include, exclude, grep, refresh] {
        g.attach_edge(pipe, clause, EdgeKind::Child);
    }

    g.attach_edge(save, file, EdgeKind::Child);
    g.attach_edge(include, include_pat, EdgeKind::Child);
    g.attach_edge(exclude, exclude_pat, EdgeKind::Child);
    g.attach_edge(grep, grep_pat, EdgeKind::Child);
    g.attach_edge(refresh, interval, EdgeKind::Child);
    g.attach_edge(interval, cls, EdgeKind::Child);

    // Pattern leaves carry free text; the filter subsystem interprets it.
    g.flags_mut(grep_pat).pattern = true;

    // Terminal clause words chain back to `|`.
    for tail in [count, file, include_pat, exclude_pat, grep_pat, interval, cls] {
        g.attach_edge(tail, pipe, EdgeKind::Loop);
    }

    pipe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::EdgeKind;

    #[test]
    fn pipe_offers_all_clauses() {
        let g = Grammar::new();
        let names: Vec<&str> = g
            .children_of(g.pipe())
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        for clause in ["count", "save", "include", "exclude", "grep", "refresh"] {
            assert!(names.contains(&clause), "missing clause {clause}");
        }
    }

    #[test]
    fn pipe_is_recursive() {
        let g = Grammar::new();
        assert!(g.node(g.pipe()).flags().recursive);
        assert!(
            g.children_of(g.pipe())
                .iter()
                .any(|e| e.target == g.pipe() && e.kind == EdgeKind::Loop)
        );
    }

    #[test]
    fn clause_tails_loop_back() {
        let g = Grammar::new();
        let pipe = g.pipe();
        let count = g
            .children_of(pipe)
            .iter()
            .find(|e| g.node(e.target).word() == "count")
            .unwrap()
            .target;
        let back = g
            .children_of(count)
            .iter()
            .find(|e| e.target == pipe)
            .unwrap();
        assert_eq!(back.kind, EdgeKind::Loop);
    }

    #[test]
    fn save_takes_a_file_leaf() {
        let g = Grammar::new();
        let save = g
            .children_of(g.pipe())
            .iter()
            .find(|e| g.node(e.target).word() == "save")
            .unwrap()
            .target;
        let leaf = g
            .children_of(save)
            .iter()
            .find(|e| g.node(e.target).is_leaf())
            .unwrap()
            .target;
        assert_eq!(g.node(leaf).word(), "<string>");
    }

    #[test]
    fn refresh_interval_offers_cls() {
        let g = Grammar::new();
        let refresh = g
            .children_of(g.pipe())
            .iter()
            .find(|e| g.node(e.target).word() == "refresh")
            .unwrap()
            .target;
        let interval = g
            .children_of(refresh)
            .iter()
            .find(|e| g.node(e.target).is_leaf())
            .unwrap()
            .target;
        let names: Vec<&str> = g
            .children_of(interval)
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        assert!(names.contains(&"cls"));
    }

    #[test]
    fn grep_pattern_is_flagged() {
        let g = Grammar::new();
        let grep = g
            .children_of(g.pipe())
            .iter()
            .find(|e| g.node(e.target).word() == "grep")
            .unwrap()
            .target;
        let pat = g
            .children_of(grep)
            .iter()
            .find(|e| g.node(e.target).is_leaf())
            .unwrap()
            .target;
        assert!(g.node(pat).flags().pattern);
    }

    #[test]
    fn grammar_with_pipe_freezes_cleanly() {
        let mut g = Grammar::new();
        g.freeze().unwrap();
    }
}
