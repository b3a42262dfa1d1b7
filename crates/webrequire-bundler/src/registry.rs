//! In-process model of the browser loader.
//!
//! [`ModuleRegistry`] follows the same protocol as `assets/webrequire.js`:
//! a module runs once every one of its requirements has run, registration
//! order does not matter, and a name is only ever registered once. Bodies are
//! Rust closures producing JSON exports.
//!
//! The JavaScript loader is never executed by the test suite. Its behaviour
//! is exercised through this model, and the tests below check that the
//! loader source contains each guard the model mirrors.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use webrequire_graph::OrderedSet;

/// A module body: receives `require` and returns `module.exports`.
pub type ModuleBody = Box<dyn FnOnce(&LocalRequire<'_>) -> Value>;

/// What happened to a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The body ran during this call.
    Executed,
    /// The body waits for these registered names.
    Waiting(Vec<String>),
    /// The name was registered before; nothing happened.
    Ignored,
}

/// `require` as seen by one module body.
pub struct LocalRequire<'a> {
    name: &'a str,
    requirements: &'a [(String, String)],
    cache: &'a FxHashMap<String, Value>,
}

impl LocalRequire<'_> {
    /// Exports of a requirement, looked up by the specifier as written.
    ///
    /// Returns `None` for a specifier the module never declared.
    pub fn require(&self, specifier: &str) -> Option<Value> {
        let (_, name) = self
            .requirements
            .iter()
            .find(|(mention, _)| mention == specifier)?;
        self.cache.get(name).cloned()
    }

    /// Name of the module being executed.
    pub fn module_name(&self) -> &str {
        self.name
    }
}

struct Pending {
    requirements: Vec<(String, String)>,
    queue: OrderedSet<String>,
    body: ModuleBody,
}

#[derive(Default)]
pub struct ModuleRegistry {
    cache: FxHashMap<String, Value>,
    registered: FxHashSet<String>,
    pending: FxHashMap<String, Pending>,
    /// Dependency name to the modules waiting for it.
    callbacks: FxHashMap<String, Vec<String>>,
    executions: Vec<String>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("cached", &self.cache.len())
            .field("pending", &self.pending.len())
            .field("executions", &self.executions)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, running it and anything waiting on it once ready.
    pub fn register(
        &mut self,
        requirements: Vec<(String, String)>,
        name: impl Into<String>,
        body: ModuleBody,
    ) -> Registration {
        let name = name.into();
        if !self.registered.insert(name.clone()) {
            return Registration::Ignored;
        }

        let queue: OrderedSet<String> = requirements
            .iter()
            .map(|(_, dependency)| dependency.clone())
            .filter(|dependency| !self.cache.contains_key(dependency))
            .collect();

        for dependency in queue.iter() {
            self.callbacks
                .entry(dependency.clone())
                .or_default()
                .push(name.clone());
        }

        let missing = queue.to_vec();
        self.pending.insert(
            name.clone(),
            Pending {
                requirements,
                queue,
                body,
            },
        );
        self.run_ready(name.clone());

        if self.cache.contains_key(&name) {
            Registration::Executed
        } else {
            Registration::Waiting(missing)
        }
    }

    /// Exports of an executed module.
    pub fn exports(&self, name: &str) -> Option<&Value> {
        self.cache.get(name)
    }

    pub fn is_executed(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Names of modules registered but still waiting.
    pub fn pending(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pending.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Module names in the order their bodies ran.
    pub fn executions(&self) -> &[String] {
        &self.executions
    }

    fn run_ready(&mut self, start: String) {
        let mut ready = vec![start];

        while let Some(name) = ready.pop() {
            let is_ready = self
                .pending
                .get(&name)
                .is_some_and(|module| module.queue.is_empty());
            if !is_ready {
                continue;
            }
            let Some(module) = self.pending.remove(&name) else {
                continue;
            };

            let exports = {
                let require = LocalRequire {
                    name: &name,
                    requirements: &module.requirements,
                    cache: &self.cache,
                };
                (module.body)(&require)
            };
            self.cache.insert(name.clone(), exports);
            self.executions.push(name.clone());

            for waiter in self.callbacks.remove(&name).unwrap_or_default() {
                if let Some(waiting) = self.pending.get_mut(&waiter) {
                    waiting.queue.remove(&name);
                    ready.push(waiter);
                }
            }
        }
    }
}
