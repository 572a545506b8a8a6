//! Layered argument scopes.
//!
//! An [`AdhocArguments`] owns a key/value store and an optional parent. A
//! lookup walks a pipe-delimited alias-spec such as `"tokenizer_path|tokenizer|=gpt2"`
//! and, for each candidate in turn, tries the local store, an inline
//! `=literal` default, an inline `!literal` warn-default, the parent chain and
//! finally the environment. Every successful local read marks the key used, so
//! that keys which were set but never consumed can be reported as likely typos
//! when the scope closes.

use crate::config;
use crate::diagnostics::{
    face_error, face_print, face_warn, unset_key_message, uninstalled_module_message,
    warn_unset_message, DEFAULT_FACE, FILES_REQUIRED_MESSAGE, TYPO_HINT, UNUSED_HEADER,
};
use crate::environ::{Environment, ProcessEnv};
use crate::error::{AdhocResult, ArgsError};
use crate::tokens::FILES_KEY;
use crate::value::{parse_literal, ArgMap, ArgValue};
use indexmap::IndexSet;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ScopeState {
    store: ArgMap,
    used: HashSet<String>,
    warned: IndexSet<String>,
}

/// One resolver scope.
pub struct AdhocArguments {
    state: Mutex<ScopeState>,
    parent: Option<Arc<AdhocArguments>>,
    environ: Arc<dyn Environment>,
    use_environ: bool,
    face: String,
}

/// Builder for root and child scopes.
pub struct ScopeBuilder {
    initial: ArgMap,
    parent: Option<Arc<AdhocArguments>>,
    expand_config: Option<String>,
    use_environ: bool,
    environ: Arc<dyn Environment>,
    face: String,
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self {
            initial: ArgMap::new(),
            parent: None,
            expand_config: None,
            use_environ: true,
            environ: Arc::new(ProcessEnv),
            face: DEFAULT_FACE.to_string(),
        }
    }

    /// Initial entries, stored as-is and not yet marked used.
    pub fn args(mut self, initial: ArgMap) -> Self {
        self.initial = initial;
        self
    }

    /// Enclosing scope. Environment settings and face are inherited from it.
    pub fn parent(mut self, parent: Arc<AdhocArguments>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Key whose value is a config file path to merge instead of storing.
    pub fn expand_config(mut self, key: impl Into<String>) -> Self {
        self.expand_config = Some(key.into());
        self
    }

    pub fn use_environ(mut self, enabled: bool) -> Self {
        self.use_environ = enabled;
        self
    }

    pub fn environ<E: Environment + 'static>(mut self, environ: E) -> Self {
        self.environ_arc(Arc::new(environ))
    }

    /// Share an environment that is already held elsewhere.
    pub fn environ_arc(mut self, environ: Arc<dyn Environment>) -> Self {
        self.environ = environ;
        self
    }

    pub fn face(mut self, face: impl Into<String>) -> Self {
        self.face = face.into();
        self
    }

    pub fn build(self) -> AdhocResult<AdhocArguments> {
        let (use_environ, environ, face) = match &self.parent {
            Some(parent) => (
                parent.use_environ,
                Arc::clone(&parent.environ),
                parent.face.clone(),
            ),
            None => (self.use_environ, self.environ, self.face),
        };
        let scope = AdhocArguments {
            state: Mutex::new(ScopeState::default()),
            parent: self.parent,
            environ,
            use_environ,
            face,
        };
        for (key, value) in self.initial {
            if self.expand_config.as_deref() == Some(key.as_str()) {
                let path = match &value {
                    ArgValue::Str(s) => s.clone(),
                    other => other.to_string(),
                };
                scope.load_config(path, true, true)?;
            } else {
                scope.state().store.insert(key, value);
            }
        }
        Ok(scope)
    }
}

fn primary_key(spec: &str) -> &str {
    spec.split('|')
        .find(|k| !k.is_empty() && !k.starts_with('=') && !k.starts_with('!'))
        .unwrap_or(spec)
}

impl AdhocArguments {
    /// Root scope over `initial`, reading the process environment.
    pub fn new(initial: ArgMap) -> Self {
        let scope = Self::child_parts(None, Arc::new(ProcessEnv), true, DEFAULT_FACE.to_string());
        scope.state().store = initial;
        scope
    }

    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    fn child_parts(
        parent: Option<Arc<AdhocArguments>>,
        environ: Arc<dyn Environment>,
        use_environ: bool,
        face: String,
    ) -> Self {
        Self {
            state: Mutex::new(ScopeState::default()),
            parent,
            environ,
            use_environ,
            face,
        }
    }

    fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn face(&self) -> &str {
        &self.face
    }

    pub fn parent(&self) -> Option<&Arc<AdhocArguments>> {
        self.parent.as_ref()
    }

    pub fn uses_environ(&self) -> bool {
        self.use_environ
    }

    /// Resolve an alias-spec. Returns `None` when no candidate resolves
    /// through any source.
    pub fn get(&self, spec: &str) -> Option<ArgValue> {
        for key in spec.split('|') {
            if key.is_empty() {
                continue;
            }
            if let Some(value) = self.read_local(key) {
                return Some(value);
            }
            if let Some(literal) = key.strip_prefix('=') {
                return Some(parse_literal(literal));
            }
            if let Some(literal) = key.strip_prefix('!') {
                let value = parse_literal(literal);
                return Some(self.warn_unset_key(primary_key(spec), value));
            }
            if let Some(parent) = &self.parent {
                if parent.resolves(key) {
                    return parent.get(key);
                }
            }
            if let Some(value) = self.read_environ(key) {
                return Some(value);
            }
        }
        None
    }

    /// Resolve an alias-spec, falling back to `default`. The default does not
    /// count as a use of any key.
    pub fn get_or(&self, spec: &str, default: impl Into<ArgValue>) -> ArgValue {
        self.get(spec).unwrap_or_else(|| default.into())
    }

    pub fn get_str(&self, spec: &str) -> Option<String> {
        self.get(spec).map(|v| match v {
            ArgValue::Str(s) => s,
            other => other.to_string(),
        })
    }

    pub fn get_usize(&self, spec: &str) -> Option<usize> {
        self.get(spec).and_then(|v| v.as_usize())
    }

    pub fn get_bool(&self, spec: &str) -> Option<bool> {
        self.get(spec).map(|v| v.is_truthy())
    }

    fn read_local(&self, key: &str) -> Option<ArgValue> {
        let mut state = self.state();
        let value = state.store.get(key).cloned()?;
        state.used.insert(key.to_string());
        Some(value)
    }

    fn environ_var(&self, key: &str) -> Option<String> {
        if !self.use_environ {
            return None;
        }
        self.environ.var(&key.to_uppercase())
    }

    fn read_environ(&self, key: &str) -> Option<ArgValue> {
        let raw = self.environ_var(key)?;
        let value = parse_literal(&raw);
        debug!("Resolved {} from environment variable {}", key, key.to_uppercase());
        let mut state = self.state();
        state.store.insert(key.to_string(), value.clone());
        state.used.insert(key.to_string());
        Some(value)
    }

    /// Whether `key` resolves anywhere along the chain.
    fn resolves(&self, key: &str) -> bool {
        self.contains(key) || self.parent.as_ref().map_or(false, |p| p.resolves(key))
    }

    /// Local store or environment only. Does not mark the key used.
    pub fn contains(&self, key: &str) -> bool {
        self.state().store.contains_key(key) || self.environ_var(key).is_some()
    }

    /// Insert or overwrite an entry. Written keys count as used.
    pub fn set(&self, key: impl Into<String>, value: impl Into<ArgValue>) {
        let key = key.into();
        let mut state = self.state();
        state.used.insert(key.clone());
        state.store.insert(key, value.into());
    }

    pub fn update(&self, other: ArgMap, overwrite: bool, mark_used: bool) {
        let mut state = self.state();
        for (key, value) in other {
            if overwrite || !state.store.contains_key(&key) {
                if mark_used {
                    state.used.insert(key.clone());
                }
                state.store.insert(key, value);
            }
        }
    }

    /// Load a config file and, when `merge` is set, merge it into the store.
    /// Merged keys stay unused until read.
    pub fn load_config<P: AsRef<Path>>(
        &self,
        path: P,
        merge: bool,
        overwrite: bool,
    ) -> AdhocResult<ArgMap> {
        let loaded = config::load_config(path.as_ref())?;
        if merge {
            debug!("Merging {} keys from {}", loaded.len(), path.as_ref().display());
            self.update(loaded.clone(), overwrite, false);
        }
        Ok(loaded)
    }

    /// Child scope holding exactly `overrides`, which are still audited.
    pub fn from_kwargs(self: &Arc<Self>, overrides: ArgMap) -> AdhocArguments {
        let child = Self::child_parts(
            Some(Arc::clone(self)),
            Arc::clone(&self.environ),
            self.use_environ,
            self.face.clone(),
        );
        child.state().store = overrides;
        child
    }

    /// Root scope built from an optional mapping, with `extras` merged as used.
    pub fn to_adhoc(base: Option<ArgMap>, extras: ArgMap) -> AdhocArguments {
        let scope = Self::new(base.unwrap_or_default());
        scope.update(extras, true, true);
        scope
    }

    /// Plain mapping of the local entries named in `keys` plus those starting
    /// with `prefix` (prefix and one following underscore stripped). All
    /// selected keys are marked used.
    pub fn subset(&self, keys: &str, prefix: Option<&str>) -> ArgMap {
        let wanted: HashSet<&str> = keys.split('|').filter(|k| !k.is_empty()).collect();
        let prefix = prefix.filter(|p| !p.is_empty());
        let mut guard = self.state();
        let ScopeState { store, used, .. } = &mut *guard;
        let mut subargs = ArgMap::new();
        for (key, value) in store.iter() {
            if wanted.contains(key.as_str()) {
                used.insert(key.clone());
                subargs.insert(key.clone(), value.clone());
            } else if let Some(rest) = prefix.and_then(|p| key.strip_prefix(p)) {
                used.insert(key.clone());
                let rest = rest.strip_prefix('_').unwrap_or(rest);
                subargs.insert(rest.to_string(), value.clone());
            }
        }
        subargs
    }

    /// Like [`subset`](Self::subset), but a key ending in `*` selects local
    /// entries by prefix (prefix stripped) and exact keys resolve through
    /// [`get`](Self::get). Keys named in `exclude` are dropped afterwards.
    pub fn get_subargs(&self, keys: &str, exclude: Option<&str>) -> ArgMap {
        let mut subargs = ArgMap::new();
        for key in keys.split('|').filter(|k| !k.is_empty()) {
            if let Some(prefix) = key.strip_suffix('*') {
                let mut guard = self.state();
                let ScopeState { store, used, .. } = &mut *guard;
                for (name, value) in store.iter() {
                    if let Some(rest) = name.strip_prefix(prefix) {
                        used.insert(name.clone());
                        subargs.insert(rest.to_string(), value.clone());
                    }
                }
            } else if key.starts_with('=') || key.starts_with('!') {
                continue;
            } else if let Some(value) = self.get(key) {
                subargs.insert(key.to_string(), value);
            }
        }
        if let Some(exclude) = exclude {
            for key in exclude.split('|') {
                subargs.shift_remove(key);
            }
        }
        subargs
    }

    /// Positional files collected by the command-line parser.
    pub fn files(&self) -> Vec<String> {
        let Some(value) = self.get(FILES_KEY) else {
            return Vec::new();
        };
        match value.as_list() {
            Some(items) => items
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), String::from))
                .collect(),
            None => vec![value.as_str().map_or_else(|| value.to_string(), String::from)],
        }
    }

    /// Copy of the local store. Reading it does not mark anything used.
    pub fn snapshot(&self) -> ArgMap {
        self.state().store.clone()
    }

    /// Local keys that were never read, in store order.
    pub fn unused_keys(&self) -> Vec<String> {
        let state = self.state();
        state
            .store
            .keys()
            .filter(|k| !state.used.contains(*k))
            .cloned()
            .collect()
    }

    /// Print the unused parameters, if any, and return their keys.
    pub fn check_unused(&self) -> Vec<String> {
        let unused = self.unused_keys();
        if unused.is_empty() {
            return unused;
        }
        face_warn(&self.face, UNUSED_HEADER);
        let store = self.snapshot();
        for key in &unused {
            if let Some(value) = store.get(key) {
                println!("{}: {}", key, value.repr());
            }
        }
        face_warn(&self.face, TYPO_HINT);
        unused
    }

    /// Unused-parameter audit. Fails naming every key that was never read.
    pub fn close(&self) -> AdhocResult<()> {
        let unused = self.unused_keys();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(ArgsError::unused_parameters(unused))
        }
    }

    /// Run `f` with this scope as a managed resource. The audit runs once
    /// when `f` returns `Ok`; an `Err` from `f` is passed through untouched.
    pub fn scoped<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Arc<AdhocArguments>) -> Result<T, E>,
        E: From<ArgsError>,
    {
        let scope = Arc::new(self);
        let output = f(&scope)?;
        scope.close()?;
        Ok(output)
    }

    /// Write the local store as pretty JSON, creating parent directories.
    pub fn save_as_json<P: AsRef<Path>>(&self, path: P) -> AdhocResult<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ArgsError::write(dir, e))?;
        }
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ArgsError::write(path, std::io::Error::other(e)))?;
        fs::write(path, json + "\n").map_err(|e| ArgsError::write(path, e))?;
        info!("Saved arguments to {}", path.display());
        Ok(())
    }

    pub fn print(&self, message: &str) {
        face_print(&self.face, message);
    }

    pub fn verbose_print(&self, message: &str) {
        face_print(&self.face, message);
    }

    /// Announce a fallback value for `key`, once per key, and return it.
    pub fn warn_unset_key(&self, key: &str, value: ArgValue) -> ArgValue {
        let first_time = self.state().warned.insert(key.to_string());
        if first_time {
            warn!("{} is not set; using {}", key, value.repr());
            face_warn(&self.face, &warn_unset_message(key, &value.to_string()));
        }
        value
    }

    /// Keys that have produced a warn-default message, in order.
    pub fn warned_keys(&self) -> Vec<String> {
        self.state().warned.iter().cloned().collect()
    }

    pub fn raise_unset_key(&self, key: &str, desc_ja: Option<&str>, desc_en: Option<&str>) -> ! {
        face_error(&self.face, &unset_key_message(key, desc_ja, desc_en));
        std::process::exit(1)
    }

    pub fn raise_uninstalled_module(&self, module: &str, install_hint: Option<&str>) -> ! {
        face_error(&self.face, &uninstalled_module_message(module));
        if let Some(hint) = install_hint {
            println!("{}", hint);
        }
        std::process::exit(1)
    }

    pub fn raise_files(&self, message: Option<&str>) -> ! {
        face_error(&self.face, message.unwrap_or(FILES_REQUIRED_MESSAGE));
        std::process::exit(1)
    }
}

impl fmt::Display for AdhocArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let store = ArgValue::Map(self.snapshot());
        match &self.parent {
            Some(parent) => write!(f, "{}+{}", store, parent),
            None => write!(f, "{}", store),
        }
    }
}

impl fmt::Debug for AdhocArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AdhocArguments")
            .field("store", &self.snapshot())
            .field("use_environ", &self.use_environ)
            .field("parent", &self.parent)
            .finish()
    }
}
