//! The execution context tree.
//!
//! Nodes live in an arena owned by [`Registry`] and point at their parent by [`NodeId`]; a node never owns its
//! parent. Besides the arena, the registry keeps the flat run order: the root first, then every group in the order
//! its defining scope *exited*.
//!
//! ## Hook inheritance
//!
//! A child inherits the hooks its parent had at the moment the child was created. Instead of copying the parent's
//! lists, a node records how many of its parent's own hooks existed at that moment ([`HookMarks`]). The effective
//! list for a phase is rebuilt by walking from the node up to the root, taking each ancestor's own hooks up to the
//! mark left by the child below it, and then reversing the collected slices so the outermost ancestor comes first.

use probe_core::FnHandle;

/// Lifecycle phase of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl HookPhase {
    pub const ALL: [HookPhase; 4] = [
        HookPhase::BeforeAll,
        HookPhase::BeforeEach,
        HookPhase::AfterEach,
        HookPhase::AfterAll,
    ];

    fn index(self) -> usize {
        match self {
            HookPhase::BeforeAll => 0,
            HookPhase::BeforeEach => 1,
            HookPhase::AfterEach => 2,
            HookPhase::AfterAll => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HookPhase::BeforeAll => "beforeAll",
            HookPhase::BeforeEach => "beforeEach",
            HookPhase::AfterEach => "afterEach",
            HookPhase::AfterAll => "afterAll",
        }
    }
}

/// Hooks registered directly on one node, per phase, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    lists: [Vec<FnHandle>; 4],
}

impl Hooks {
    pub fn get(&self, phase: HookPhase) -> &[FnHandle] {
        &self.lists[phase.index()]
    }

    fn push(&mut self, phase: HookPhase, handle: FnHandle) {
        self.lists[phase.index()].push(handle);
    }

    fn marks(&self) -> HookMarks {
        HookMarks(self.lists.each_ref().map(Vec::len))
    }
}

/// Per-phase count of a parent's own hooks at the time a child was forked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookMarks([usize; 4]);

impl HookMarks {
    pub fn get(&self, phase: HookPhase) -> usize {
        self.0[phase.index()]
    }
}

/// Arena index of an [`ExecutionNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A registered test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntry {
    pub name: String,
    pub body: FnHandle,
    /// The test is expected to fail.
    pub negated: bool,
}

/// A `describe` scope.
#[derive(Debug, Clone)]
pub struct ExecutionNode {
    name: String,
    own: Hooks,
    inherited: HookMarks,
    parent: Option<NodeId>,
    tests: Vec<TestEntry>,
    todos: Vec<String>,
}

impl ExecutionNode {
    fn root() -> Self {
        Self {
            name: String::new(),
            own: Hooks::default(),
            inherited: HookMarks::default(),
            parent: None,
            tests: Vec::new(),
            todos: Vec::new(),
        }
    }

    /// Fully qualified name (ancestor names joined by a space).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Hooks registered on this node itself (not inherited ones).
    pub fn own_hooks(&self) -> &Hooks {
        &self.own
    }

    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    pub fn todos(&self) -> &[String] {
        &self.todos
    }
}

/// Arena of nodes plus their run order.
#[derive(Debug, Clone)]
pub struct Registry {
    nodes: Vec<ExecutionNode>,
    order: Vec<NodeId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub const ROOT: NodeId = NodeId(0);

    /// Create a registry holding only the (unregistered) root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![ExecutionNode::root()],
            order: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &ExecutionNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, the root included; never zero.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in run order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ExecutionNode)> + '_ {
        self.order.iter().map(|&id| (id, self.node(id)))
    }

    /// Create a child of `parent`, snapshotting the parent's current hook counts.
    pub(crate) fn fork(&mut self, parent: NodeId, name: &str) -> NodeId {
        let parent_node = self.node(parent);
        let qualified = if parent_node.name.is_empty() {
            name.to_string()
        } else if name.is_empty() {
            parent_node.name.clone()
        } else {
            format!("{} {}", parent_node.name, name)
        };
        let child = ExecutionNode {
            name: qualified,
            own: Hooks::default(),
            inherited: parent_node.own.marks(),
            parent: Some(parent),
            tests: Vec::new(),
            todos: Vec::new(),
        };
        self.nodes.push(child);
        NodeId(self.nodes.len() - 1)
    }

    /// Append `id` to the run order.
    pub(crate) fn append(&mut self, id: NodeId) {
        self.order.push(id);
    }

    pub(crate) fn push_test(&mut self, id: NodeId, entry: TestEntry) {
        self.nodes[id.0].tests.push(entry);
    }

    pub(crate) fn push_todo(&mut self, id: NodeId, description: &str) {
        self.nodes[id.0].todos.push(description.to_string());
    }

    pub(crate) fn push_hook(&mut self, id: NodeId, phase: HookPhase, handle: FnHandle) {
        self.nodes[id.0].own.push(phase, handle);
    }

    /// Effective hooks of `id` for `phase`: inherited ancestor hooks (outermost first), then the node's own.
    pub fn hooks(&self, id: NodeId, phase: HookPhase) -> Vec<FnHandle> {
        let node = self.node(id);
        let mut chunks: Vec<&[FnHandle]> = vec![node.own.get(phase)];
        let mut limit = node.inherited.get(phase);
        let mut cursor = node.parent;

        while let Some(parent_id) = cursor {
            let parent = self.node(parent_id);
            let own = parent.own.get(phase);
            chunks.push(&own[..limit.min(own.len())]);
            limit = parent.inherited.get(phase);
            cursor = parent.parent;
        }

        chunks.iter().rev().flat_map(|chunk| chunk.iter().copied()).collect()
    }
}
