//! Registration of groups, tests, todos and hooks.
//!
//! Registration runs once, before anything executes. Guest callables are stored in a [`FunctionTable`] and the
//! context tree only keeps their [`FnHandle`]s.

use probe_core::{FnHandle, Trap, TrapCode};

use crate::context::{HookPhase, NodeId, Registry, TestEntry};
use crate::env::Env;

/// Body of a test or a hook.
pub type GuestFn = Box<dyn Fn(&mut Env<'_>) -> Result<(), Trap>>;

/// A callable in the guest's function table.
pub struct GuestFunction {
    label: String,
    body: GuestFn,
}

impl GuestFunction {
    /// Name used for this callable's frame on the shadow stack.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn call(&self, env: &mut Env<'_>) -> Result<(), Trap> {
        (self.body)(env)
    }
}

/// Most callables a table can hold: every `u32` index except the one reserved for [`FnHandle::NONE`].
pub const MAX_FUNCTIONS: usize = u32::MAX as usize;

/// The guest's indirect function table.
pub struct FunctionTable {
    functions: Vec<GuestFunction>,
    limit: usize,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::with_limit(MAX_FUNCTIONS)
    }
}

impl FunctionTable {
    /// A table that holds at most `limit` callables (never more than [`MAX_FUNCTIONS`]).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            functions: Vec::new(),
            limit: limit.min(MAX_FUNCTIONS),
        }
    }

    pub fn insert(&mut self, label: impl Into<String>, body: GuestFn) -> Result<FnHandle, Trap> {
        let len = self.functions.len();
        let index = u32::try_from(len).ok().filter(|_| len < self.limit).ok_or_else(|| {
            Trap::new(TrapCode::TableOverflow, format!("cannot register more than {} callables", self.limit))
        })?;
        self.functions.push(GuestFunction {
            label: label.into(),
            body,
        });
        Ok(FnHandle::new(index))
    }

    pub fn get(&self, handle: FnHandle) -> Option<&GuestFunction> {
        if handle.is_none() {
            return None;
        }
        self.functions.get(handle.index() as usize)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Registration-time state of one module: the context tree under construction, the function table, and the
/// stack of open `describe` scopes.
///
/// ```ignore
/// let mut session = Session::new();
/// session.describe("math", |s| {
///     s.before_each(|_| Ok(()));
///     s.test("adds", |env| env.expect(1 + 1).to_be(2));
/// });
/// let (registry, table) = session.finish()?;
/// ```
pub struct Session {
    registry: Registry,
    table: FunctionTable,
    scopes: Vec<NodeId>,
    /// First registration that did not fit in the function table.
    overflow: Option<Trap>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a session. The root node is created and placed first in the run order.
    pub fn new() -> Self {
        let mut registry = Registry::new();
        registry.append(Registry::ROOT);
        Self {
            registry,
            table: FunctionTable::default(),
            scopes: vec![Registry::ROOT],
            overflow: None,
        }
    }

    /// Cap the number of callables (tests and hooks) this session may register.
    pub fn with_function_limit(mut self, limit: usize) -> Self {
        self.table = FunctionTable::with_limit(limit);
        self
    }

    fn active(&self) -> NodeId {
        self.scopes.last().copied().unwrap_or(Registry::ROOT)
    }

    fn label(&self, suffix: &str) -> String {
        let group = self.registry.node(self.active()).name();
        if group.is_empty() {
            suffix.to_string()
        } else {
            format!("{group} {suffix}")
        }
    }

    /// Open a child group, run `body` inside it, and register the group once `body` returns.
    ///
    /// Because a group is registered when its scope exits, nested groups precede their parent in run order.
    pub fn describe(&mut self, description: &str, body: impl FnOnce(&mut Session)) {
        let child = self.registry.fork(self.active(), description);
        self.scopes.push(child);
        body(self);
        self.scopes.pop();
        self.registry.append(child);
    }

    /// Register a test that is expected to pass.
    pub fn test(&mut self, description: &str, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_test(description, Box::new(body), false);
    }

    /// Alias of [`Session::test`].
    pub fn it(&mut self, description: &str, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_test(description, Box::new(body), false);
    }

    /// Register a test that is expected to fail.
    pub fn throws(&mut self, description: &str, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_test(description, Box::new(body), true);
    }

    /// Register a placeholder.
    pub fn todo(&mut self, description: &str) {
        self.registry.push_todo(self.active(), description);
    }

    /// A disabled test. Its body is discarded and it is reported as a todo.
    pub fn xit(&mut self, description: &str, _body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.todo(description);
    }

    /// Alias of [`Session::xit`].
    pub fn xtest(&mut self, description: &str, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.xit(description, body);
    }

    pub fn before_all(&mut self, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_hook(HookPhase::BeforeAll, Box::new(body));
    }

    pub fn before_each(&mut self, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_hook(HookPhase::BeforeEach, Box::new(body));
    }

    pub fn after_each(&mut self, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_hook(HookPhase::AfterEach, Box::new(body));
    }

    pub fn after_all(&mut self, body: impl Fn(&mut Env<'_>) -> Result<(), Trap> + 'static) {
        self.push_hook(HookPhase::AfterAll, Box::new(body));
    }

    /// Close registration and hand back the context tree and the function table.
    ///
    /// Fails with a [`TrapCode::TableOverflow`] trap if any test or hook could not be registered.
    pub fn finish(self) -> Result<(Registry, FunctionTable), Trap> {
        match self.overflow {
            Some(trap) => Err(trap),
            None => Ok((self.registry, self.table)),
        }
    }

    fn push_test(&mut self, description: &str, body: GuestFn, negated: bool) {
        let label = self.label(description);
        let Some(handle) = self.register(label, body) else {
            return;
        };
        self.registry.push_test(
            self.active(),
            TestEntry {
                name: description.to_string(),
                body: handle,
                negated,
            },
        );
    }

    fn push_hook(&mut self, phase: HookPhase, body: GuestFn) {
        let label = self.label(phase.as_str());
        if let Some(handle) = self.register(label, body) {
            self.registry.push_hook(self.active(), phase, handle);
        }
    }

    fn register(&mut self, label: String, body: GuestFn) -> Option<FnHandle> {
        match self.table.insert(label, body) {
            Ok(handle) => Some(handle),
            Err(trap) => {
                tracing::warn!(%trap, "callable not registered");
                self.overflow.get_or_insert(trap);
                None
            }
        }
    }
}
