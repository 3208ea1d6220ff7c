//! The static command grammar.
//!
//! Nodes live in an arena and reference children by index, so a subtree can
//! be shared by several parents without duplication: a negation twin aliases
//! its positive sibling's child set, universal shortcuts are single alias
//! nodes pushed into many parents, and the pipe node participates in
//! deliberate cycles marked with `EdgeKind::Loop`.
//!
//! Construction-then-freeze discipline: the grammar is mutable while the
//! application registers its command surface, `freeze()` validates the tree,
//! and no registration is accepted afterward. The only post-freeze mutations
//! are the universal shortcut install/uninstall pair driven by mode entry
//! and exit.

use std::rc::Rc;

use vtyline_types::{LeafType, Result, VtyError};

use crate::handler::{CommandHandler, LeafValidator, ValueDisplay};
use crate::{MAX_CHILDREN, filter};

/// Index of a node in the grammar arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge kinds distinguish ordinary tree edges from deliberate cycles.
///
/// `Loop` marks a recursive node's self-reference and the filter leaves'
/// jump back to the pipe node; acyclicity validation skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Child,
    Loop,
}

/// A directed edge to a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: NodeId,
    pub kind: EdgeKind,
}

/// What a node is: a fixed keyword, the negation keyword, or a typed slot.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Command { name: String },
    Negation { name: String },
    Leaf { leaf_type: LeafType, leaf_id: u32 },
}

/// Behavior flags on a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeFlags {
    /// Excluded from help listings and completion display (still matchable).
    pub no_expand: bool,
    /// Never listed at all.
    pub hidden: bool,
    /// Node lists itself as its own child (pipe chaining).
    pub recursive: bool,
    /// Leaf text is pattern-constrained; the application validator decides.
    pub pattern: bool,
    /// Fire every handler on the path at submission, not just the last.
    pub batch: bool,
    /// Accepting this node's word with Enter opens a configuration mode.
    pub mode: bool,
}

/// Child storage: owned edge list, or an alias of another node's list.
///
/// A negation twin holds `Alias(positive)` so both forms parse identically
/// from that point down and later registrations under the positive node are
/// visible through the twin.
#[derive(Debug, Clone)]
enum ChildSet {
    Own(Vec<Edge>),
    Alias(NodeId),
}

/// A node in the grammar tree.
pub struct Node {
    kind: NodeKind,
    help: String,
    flags: NodeFlags,
    code: u32,
    handler: Option<Rc<dyn CommandHandler>>,
    validator: Option<Rc<dyn LeafValidator>>,
    display: Option<Rc<dyn ValueDisplay>>,
    children: ChildSet,
}

impl Node {
    fn new(kind: NodeKind, help: String) -> Self {
        Self {
            kind,
            help,
            flags: NodeFlags::default(),
            code: 0,
            handler: None,
            validator: None,
            display: None,
            children: ChildSet::Own(Vec::new()),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Opaque application code handed back to the handler.
    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn handler(&self) -> Option<Rc<dyn CommandHandler>> {
        self.handler.clone()
    }

    pub fn validator(&self) -> Option<Rc<dyn LeafValidator>> {
        self.validator.clone()
    }

    pub fn display(&self) -> Option<Rc<dyn ValueDisplay>> {
        self.display.clone()
    }

    /// Keyword text, or the type placeholder for a leaf.
    pub fn word(&self) -> &str {
        match &self.kind {
            NodeKind::Command { name } | NodeKind::Negation { name } => name,
            NodeKind::Leaf { leaf_type, .. } => leaf_type.placeholder(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_negation(&self) -> bool {
        matches!(self.kind, NodeKind::Negation { .. })
    }
}

/// The fixed top-level hooks every grammar starts with.
#[derive(Debug, Clone, Copy)]
pub struct TopHooks {
    pub show: NodeId,
    pub config: NodeId,
    pub debug: NodeId,
    pub clear: NodeId,
    pub run: NodeId,
}

/// The static command grammar: arena of nodes plus top-level hooks.
///
/// Nodes carry no parent pointers: every runtime walk that needs upward
/// navigation has the cursor's path stack instead.
pub struct Grammar {
    nodes: Vec<Node>,
    root: NodeId,
    hooks: TopHooks,
    pipe: NodeId,
    universals: Vec<NodeId>,
    frozen: bool,
}

impl Grammar {
    /// Empty grammar: root, the five top-level hooks, the shared pipe
    /// subtree, and the universal shortcut aliases derived from the hooks.
    pub fn new() -> Self {
        let mut g = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            hooks: TopHooks {
                show: NodeId(0),
                config: NodeId(0),
                debug: NodeId(0),
                clear: NodeId(0),
                run: NodeId(0),
            },
            pipe: NodeId(0),
            universals: Vec::new(),
            frozen: false,
        };
        g.root = g.alloc(Node::new(
            NodeKind::Command {
                name: String::new(),
            },
            "command root".to_string(),
        ));

        let show = g.make_command("show", "Display operational state");
        let config = g.make_command("config", "Enter configuration commands");
        let debug = g.make_command("debug", "Enable diagnostic output");
        let clear = g.make_command("clear", "Reset operational state");
        let run = g.make_command("run", "Execute a stored command script");
        for hook in [show, config, debug, clear, run] {
            g.attach(g.root, hook, EdgeKind::Child);
        }
        // Entering the config branch opens the configuration mode.
        g.nodes[config.index()].flags.mode = true;
        g.hooks = TopHooks {
            show,
            config,
            debug,
            clear,
            run,
        };

        g.pipe = filter::build_pipe_subtree(&mut g);

        // Universal shortcuts: alias nodes sharing the hooks' child sets,
        // tagged no-expand so mode listings stay uncluttered.
        for (hook, name, help) in [
            (show, "show", "Display operational state"),
            (config, "config", "Enter configuration commands"),
        ] {
            let mut node = Node::new(
                NodeKind::Command {
                    name: name.to_string(),
                },
                help.to_string(),
            );
            node.flags.no_expand = true;
            node.children = ChildSet::Alias(hook);
            let id = g.alloc(node);
            g.universals.push(id);
        }

        g
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // Unchecked edge append, for construction internals only.
    fn attach(&mut self, parent: NodeId, child: NodeId, kind: EdgeKind) {
        if let ChildSet::Own(edges) = &mut self.nodes[parent.index()].children {
            edges.push(Edge {
                target: child,
                kind,
            });
        }
    }

    // Infallible edge append for the fixed built-in subtrees; a
    // self-reference sets the recursive flag.
    pub(crate) fn attach_edge(&mut self, parent: NodeId, child: NodeId, kind: EdgeKind) {
        self.attach(parent, child, kind);
        if parent == child {
            self.nodes[parent.index()].flags.recursive = true;
        }
    }

    pub(crate) fn flags_mut(&mut self, id: NodeId) -> &mut NodeFlags {
        &mut self.nodes[id.index()].flags
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(VtyError::Grammar(
                "grammar is frozen; registration must complete before parsing".into(),
            ));
        }
        Ok(())
    }

    // -- Node constructors --

    /// Create a command keyword node.
    pub fn make_command(&mut self, name: &str, help: &str) -> NodeId {
        self.alloc(Node::new(
            NodeKind::Command {
                name: name.to_string(),
            },
            help.to_string(),
        ))
    }

    /// Create a typed leaf node.
    pub fn make_leaf(&mut self, leaf_type: LeafType, leaf_id: u32, help: &str) -> NodeId {
        self.alloc(Node::new(
            NodeKind::Leaf { leaf_type, leaf_id },
            help.to_string(),
        ))
    }

    // -- Node attribute setters --

    /// Attach an application handler and its opaque code to a node.
    pub fn set_handler(
        &mut self,
        node: NodeId,
        handler: Rc<dyn CommandHandler>,
        code: u32,
    ) -> Result<()> {
        self.ensure_mutable()?;
        let n = &mut self.nodes[node.index()];
        n.handler = Some(handler);
        n.code = code;
        Ok(())
    }

    pub fn set_code(&mut self, node: NodeId, code: u32) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].code = code;
        Ok(())
    }

    pub fn set_validator(&mut self, node: NodeId, v: Rc<dyn LeafValidator>) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].validator = Some(v);
        Ok(())
    }

    pub fn set_display(&mut self, node: NodeId, d: Rc<dyn ValueDisplay>) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].display = Some(d);
        Ok(())
    }

    /// Fire every handler on the path at submission, root to leaf.
    pub fn mark_batch(&mut self, node: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].flags.batch = true;
        Ok(())
    }

    pub fn mark_hidden(&mut self, node: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].flags.hidden = true;
        Ok(())
    }

    pub fn mark_no_expand(&mut self, node: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].flags.no_expand = true;
        Ok(())
    }

    /// Mark a leaf as pattern-constrained. The engine never interprets the
    /// pattern; the application validator enforces it.
    pub fn mark_pattern(&mut self, node: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].flags.pattern = true;
        Ok(())
    }

    /// Accepting this node's word with Enter opens a configuration mode.
    pub fn mark_mode(&mut self, node: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        self.nodes[node.index()].flags.mode = true;
        Ok(())
    }

    // -- Registration --

    /// Append `child` into the first free slot of `parent`'s children.
    ///
    /// Registering under a negation twin resolves to the shared set.
    /// Errors: capacity exceeded, a second leaf at one level, a leaf under
    /// a recursive node, or registration after `freeze()`.
    pub fn register(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        let owner = self.resolve_owner(parent);
        let child_is_leaf = self.nodes[child.index()].is_leaf();
        let owner_node = &self.nodes[owner.index()];

        if child_is_leaf && owner_node.flags.recursive {
            return Err(VtyError::Grammar(format!(
                "cannot attach a leaf under recursive node '{}'",
                owner_node.word()
            )));
        }

        let ChildSet::Own(edges) = &owner_node.children else {
            return Err(VtyError::Grammar("alias node cannot own children".into()));
        };
        if edges.len() >= MAX_CHILDREN {
            return Err(VtyError::Grammar(format!(
                "children of '{}' exceed capacity {MAX_CHILDREN}",
                owner_node.word()
            )));
        }
        if child_is_leaf
            && edges
                .iter()
                .any(|e| self.nodes[e.target.index()].is_leaf())
        {
            return Err(VtyError::Grammar(format!(
                "node '{}' already offers a leaf at this level",
                owner_node.word()
            )));
        }

        self.attach(owner, child, EdgeKind::Child);
        Ok(())
    }

    /// Add a deliberate cycle edge. A self-reference sets the recursive
    /// flag; the filter leaves use this to loop back to the pipe node.
    pub fn register_loop(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_mutable()?;
        let owner = self.resolve_owner(parent);
        {
            let ChildSet::Own(edges) = &self.nodes[owner.index()].children else {
                return Err(VtyError::Grammar("alias node cannot own children".into()));
            };
            if edges.len() >= MAX_CHILDREN {
                return Err(VtyError::Grammar(format!(
                    "children of '{}' exceed capacity {MAX_CHILDREN}",
                    self.nodes[owner.index()].word()
                )));
            }
        }
        self.attach(owner, child, EdgeKind::Loop);
        if owner == child {
            self.nodes[owner.index()].flags.recursive = true;
        }
        Ok(())
    }

    /// Synthesize a `no` twin under `node`, sharing `node`'s children.
    ///
    /// The twin aliases the node's child set rather than cloning it, so
    /// the positive and negated forms parse identically from that point
    /// down — including the twin itself appearing among its own resolved
    /// children, which the cursor suppresses once a negation has been
    /// accepted. Fatal if a negation sibling already exists at this level.
    pub fn install_negation(&mut self, node: NodeId) -> Result<NodeId> {
        self.ensure_mutable()?;
        let owner = self.resolve_owner(node);

        let ChildSet::Own(edges) = &self.nodes[owner.index()].children else {
            return Err(VtyError::Grammar("alias node cannot own children".into()));
        };
        if edges
            .iter()
            .any(|e| self.nodes[e.target.index()].is_negation())
        {
            return Err(VtyError::Grammar(format!(
                "negation already installed under '{}'",
                self.nodes[owner.index()].word()
            )));
        }
        if edges.len() >= MAX_CHILDREN {
            return Err(VtyError::Grammar(format!(
                "children of '{}' exceed capacity {MAX_CHILDREN}",
                self.nodes[owner.index()].word()
            )));
        }

        let mut twin = Node::new(
            NodeKind::Negation {
                name: "no".to_string(),
            },
            "Negate a command".to_string(),
        );
        twin.children = ChildSet::Alias(owner);
        let twin_id = self.alloc(twin);
        self.attach(owner, twin_id, EdgeKind::Child);
        log::debug!(
            "installed negation twin under '{}'",
            self.nodes[owner.index()].word()
        );
        Ok(twin_id)
    }

    // -- Universal shortcuts --

    /// Append the universal shortcut aliases (`show`, `config`) to `node`,
    /// skipping names listed in `except` and names the node already offers.
    ///
    /// Sanctioned post-freeze mutation: mode entry installs shortcuts on
    /// the new mode root.
    pub fn install_universal(&mut self, node: NodeId, except: &[&str]) -> Result<()> {
        let universals = self.universals.clone();
        for u in universals {
            let name = self.nodes[u.index()].word().to_string();
            if except.contains(&name.as_str()) {
                continue;
            }
            let owner = self.resolve_owner(node);
            let ChildSet::Own(edges) = &self.nodes[owner.index()].children else {
                return Err(VtyError::Grammar("alias node cannot own children".into()));
            };
            if edges.iter().any(|e| {
                e.target == u || self.nodes[e.target.index()].word() == name
            }) {
                continue;
            }
            if edges.len() >= MAX_CHILDREN {
                return Err(VtyError::Grammar(format!(
                    "children of '{}' exceed capacity {MAX_CHILDREN}",
                    self.nodes[owner.index()].word()
                )));
            }
            self.attach(owner, u, EdgeKind::Child);
        }
        Ok(())
    }

    /// Remove exactly the universal shortcut slots previously installed on
    /// `node`. Sanctioned post-freeze mutation (mode exit).
    pub fn uninstall_universal(&mut self, node: NodeId) {
        let owner = self.resolve_owner(node);
        let universals = self.universals.clone();
        if let ChildSet::Own(edges) = &mut self.nodes[owner.index()].children {
            edges.retain(|e| !universals.contains(&e.target));
        }
    }

    /// Whether `node` is one of the universal shortcut aliases.
    pub fn is_universal(&self, node: NodeId) -> bool {
        self.universals.contains(&node)
    }

    /// Permit piping this command's output: a `Loop` edge to the shared
    /// pipe node, so every filter path stays a sanctioned cycle.
    pub fn allow_filter(&mut self, node: NodeId) -> Result<()> {
        let pipe = self.pipe;
        self.register_loop(node, pipe)
    }

    // -- Freeze --

    /// Validate the grammar and bar further registration.
    ///
    /// The tree must be acyclic over `Child` edges; the deliberate cycles
    /// (recursive self-references and the pipe loop-backs) are `Loop`
    /// edges and are skipped, as is the self-edge a negation twin sees
    /// through its own alias.
    pub fn freeze(&mut self) -> Result<()> {
        self.ensure_mutable()?;
        self.check_acyclic()?;
        self.frozen = true;
        log::debug!("grammar frozen: {} nodes", self.nodes.len());
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_acyclic(&self) -> Result<()> {
        // Tri-color DFS over resolved Child edges. Shared subtrees (the
        // negation aliases, universal shortcuts) are legal; gray hits are
        // not.
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        fn visit(g: &Grammar, id: NodeId, color: &mut [u8]) -> Result<()> {
            color[id.index()] = GRAY;
            for edge in g.children_of(id) {
                if edge.kind == EdgeKind::Loop || edge.target == id {
                    continue;
                }
                match color[edge.target.index()] {
                    WHITE => visit(g, edge.target, color)?,
                    GRAY => {
                        return Err(VtyError::Grammar(format!(
                            "cycle through '{}' without a Loop edge",
                            g.node(edge.target).word()
                        )));
                    },
                    _ => {},
                }
            }
            color[id.index()] = BLACK;
            Ok(())
        }

        let mut color = vec![WHITE; self.nodes.len()];
        visit(self, self.root, &mut color)
    }

    // -- Lookup --

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn hooks(&self) -> TopHooks {
        self.hooks
    }

    /// The shared pipe/filter node (`|`).
    pub fn pipe(&self) -> NodeId {
        self.pipe
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// A node's edges, resolving a negation twin to the shared set.
    pub fn children_of(&self, id: NodeId) -> &[Edge] {
        let node = &self.nodes[id.index()];
        match &node.children {
            ChildSet::Own(edges) => edges,
            ChildSet::Alias(target) => match &self.nodes[target.index()].children {
                ChildSet::Own(edges) => edges,
                // Aliases never chain; a twin always targets an owner.
                ChildSet::Alias(_) => &[],
            },
        }
    }

    fn resolve_owner(&self, id: NodeId) -> NodeId {
        match &self.nodes[id.index()].children {
            ChildSet::Own(_) => id,
            ChildSet::Alias(target) => *target,
        }
    }

    /// Whether the typed path frame sits on the config branch (the config
    /// hook itself or its universal alias).
    pub fn is_config_entry(&self, id: NodeId) -> bool {
        id == self.hooks.config
            || (self.is_universal(id) && self.node(id).word() == "config")
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grammar_has_hooks_under_root() {
        let g = Grammar::new();
        let names: Vec<&str> = g
            .children_of(g.root())
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        assert_eq!(names, vec!["show", "config", "debug", "clear", "run"]);
    }

    #[test]
    fn config_hook_is_a_mode() {
        let g = Grammar::new();
        assert!(g.node(g.hooks().config).flags().mode);
        assert!(!g.node(g.hooks().show).flags().mode);
    }

    #[test]
    fn register_appends_child() {
        let mut g = Grammar::new();
        let version = g.make_command("version", "Software version");
        g.register(g.hooks().show, version).unwrap();
        let kids = g.children_of(g.hooks().show);
        assert_eq!(kids.len(), 1);
        assert_eq!(g.node(kids[0].target).word(), "version");
    }

    #[test]
    fn register_capacity_bounded() {
        let mut g = Grammar::new();
        let parent = g.make_command("p", "");
        g.register(g.hooks().show, parent).unwrap();
        for i in 0..MAX_CHILDREN {
            let c = g.make_command(&format!("c{i}"), "");
            g.register(parent, c).unwrap();
        }
        let extra = g.make_command("extra", "");
        let err = g.register(parent, extra).unwrap_err();
        assert!(format!("{err}").contains("capacity"));
    }

    #[test]
    fn one_leaf_per_level() {
        let mut g = Grammar::new();
        let parent = g.make_command("p", "");
        let leaf_a = g.make_leaf(LeafType::String, 1, "");
        let leaf_b = g.make_leaf(LeafType::Int, 2, "");
        g.register(g.hooks().show, parent).unwrap();
        g.register(parent, leaf_a).unwrap();
        let err = g.register(parent, leaf_b).unwrap_err();
        assert!(format!("{err}").contains("leaf"));
    }

    #[test]
    fn leaf_under_recursive_node_rejected() {
        let mut g = Grammar::new();
        let rec = g.make_command("again", "");
        g.register(g.hooks().show, rec).unwrap();
        g.register_loop(rec, rec).unwrap();
        assert!(g.node(rec).flags().recursive);
        let leaf = g.make_leaf(LeafType::Int, 1, "");
        let err = g.register(rec, leaf).unwrap_err();
        assert!(format!("{err}").contains("recursive"));
    }

    #[test]
    fn negation_shares_children_by_identity() {
        let mut g = Grammar::new();
        let twin = g.install_negation(g.hooks().config).unwrap();

        // Mutating the child set after installation is visible through the
        // twin: same storage, not a copy.
        let host = g.make_command("host-name", "System host name");
        g.register(g.hooks().config, host).unwrap();
        let via_twin: Vec<NodeId> = g.children_of(twin).iter().map(|e| e.target).collect();
        let via_config: Vec<NodeId> = g
            .children_of(g.hooks().config)
            .iter()
            .map(|e| e.target)
            .collect();
        assert_eq!(via_twin, via_config);
        assert!(via_twin.contains(&host));
        // The twin sees itself through the shared set; the cursor hides it
        // once a negation has been accepted.
        assert!(via_twin.contains(&twin));
    }

    #[test]
    fn duplicate_negation_rejected() {
        let mut g = Grammar::new();
        g.install_negation(g.hooks().config).unwrap();
        let err = g.install_negation(g.hooks().config).unwrap_err();
        assert!(format!("{err}").contains("negation already installed"));
    }

    #[test]
    fn negation_after_freeze_rejected() {
        let mut g = Grammar::new();
        g.freeze().unwrap();
        assert!(g.install_negation(g.hooks().config).is_err());
    }

    #[test]
    fn register_via_twin_lands_in_shared_set() {
        let mut g = Grammar::new();
        let twin = g.install_negation(g.hooks().config).unwrap();
        let host = g.make_command("host-name", "");
        g.register(twin, host).unwrap();
        assert!(
            g.children_of(g.hooks().config)
                .iter()
                .any(|e| e.target == host)
        );
    }

    #[test]
    fn negated_grammar_freezes_cleanly() {
        let mut g = Grammar::new();
        let host = g.make_command("host-name", "");
        g.register(g.hooks().config, host).unwrap();
        g.install_negation(g.hooks().config).unwrap();
        g.freeze().unwrap();
    }

    #[test]
    fn universal_install_and_uninstall_exact() {
        let mut g = Grammar::new();
        let iface = g.make_command("interface", "");
        g.register(g.hooks().config, iface).unwrap();
        let before = g.children_of(iface).len();

        g.install_universal(iface, &[]).unwrap();
        assert_eq!(g.children_of(iface).len(), before + 2);

        g.uninstall_universal(iface);
        assert_eq!(g.children_of(iface).len(), before);
    }

    #[test]
    fn universal_except_suppresses() {
        let mut g = Grammar::new();
        let iface = g.make_command("interface", "");
        g.register(g.hooks().config, iface).unwrap();
        g.install_universal(iface, &["config"]).unwrap();
        let names: Vec<&str> = g
            .children_of(iface)
            .iter()
            .map(|e| g.node(e.target).word())
            .collect();
        assert!(names.contains(&"show"));
        assert!(!names.contains(&"config"));
    }

    #[test]
    fn universal_install_idempotent() {
        let mut g = Grammar::new();
        let iface = g.make_command("interface", "");
        g.register(g.hooks().config, iface).unwrap();
        g.install_universal(iface, &[]).unwrap();
        g.install_universal(iface, &[]).unwrap();
        let count = g
            .children_of(iface)
            .iter()
            .filter(|e| g.is_universal(e.target))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn universal_nodes_are_no_expand() {
        let g = Grammar::new();
        let uni: Vec<NodeId> = (0..g.node_count() as u32)
            .map(NodeId)
            .filter(|id| g.is_universal(*id))
            .collect();
        assert_eq!(uni.len(), 2);
        for id in uni {
            assert!(g.node(id).flags().no_expand);
        }
    }

    #[test]
    fn freeze_bars_registration() {
        let mut g = Grammar::new();
        let n = g.make_command("x", "");
        g.register(g.hooks().show, n).unwrap();
        g.freeze().unwrap();
        let m = g.make_command("y", "");
        assert!(g.register(g.hooks().show, m).is_err());
        assert!(g.is_frozen());
    }

    #[test]
    fn freeze_accepts_pipe_cycles() {
        let mut g = Grammar::new();
        g.freeze().unwrap();
    }

    #[test]
    fn freeze_rejects_child_edge_cycle() {
        let mut g = Grammar::new();
        let a = g.make_command("a", "");
        let b = g.make_command("b", "");
        g.register(g.hooks().show, a).unwrap();
        g.register(a, b).unwrap();
        // Close a cycle with an ordinary edge instead of a Loop edge.
        g.attach(b, a, EdgeKind::Child);
        let err = g.freeze().unwrap_err();
        assert!(format!("{err}").contains("cycle"));
    }

    #[test]
    fn universal_install_allowed_after_freeze() {
        let mut g = Grammar::new();
        let iface = g.make_command("interface", "");
        g.register(g.hooks().config, iface).unwrap();
        g.freeze().unwrap();
        g.install_universal(iface, &[]).unwrap();
        g.uninstall_universal(iface);
    }

    #[test]
    fn config_entry_detection() {
        let g = Grammar::new();
        assert!(g.is_config_entry(g.hooks().config));
        assert!(!g.is_config_entry(g.hooks().show));
        let uni_config = (0..g.node_count() as u32)
            .map(NodeId)
            .find(|id| g.is_universal(*id) && g.node(*id).word() == "config")
            .unwrap();
        assert!(g.is_config_entry(uni_config));
    }

    #[test]
    fn handler_code_roundtrip() {
        let mut g = Grammar::new();
        let n = g.make_command("version", "");
        g.register(g.hooks().show, n).unwrap();
        g.set_handler(
            n,
            Rc::new(|_c: u32, _a: &[vtyline_types::TokenValue], _m: crate::CommandMode| Ok(())),
            77,
        )
        .unwrap();
        assert_eq!(g.node(n).code(), 77);
        assert!(g.node(n).handler().is_some());
    }

    #[test]
    fn leaf_word_is_placeholder() {
        let mut g = Grammar::new();
        let leaf = g.make_leaf(LeafType::Ipv4, 3, "Address");
        assert_eq!(g.node(leaf).word(), "<ipv4>");
    }
}
