//! Generated-procedure store keyed by loop signature.

use crate::error::SpecificationError;
use ahash::AHashMap;
use indexmap::IndexMap;
use loops_term::{Atom, Template, Term, fingerprint, normalize};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Structural identity of a loop: its settled iterator list and its body,
/// up to variable renaming.
#[derive(Clone, Debug)]
pub struct Signature {
    shape: Term,
    fingerprint: u64,
}

impl Signature {
    pub fn of(specs: &Term, body: &Term) -> Self {
        let (shape, _) = normalize(&Term::compound("do", vec![specs.clone(), body.clone()]));
        let fingerprint = fingerprint(&shape);
        Self { shape, fingerprint }
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn shape(&self) -> &Term {
        &self.shape
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && self.shape == other.shape
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.fingerprint)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcedureHandle(u32);

impl ProcedureHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered loop procedure. Immutable once stored.
#[derive(Debug)]
pub struct GeneratedProcedure {
    pub name: Atom,
    pub arity: usize,
    /// Terminating clause: the head only, its body is `true`.
    pub base: Template,
    /// `[head, body]` of the recursive clause.
    pub recursive: Template,
}

impl GeneratedProcedure {
    /// Both clauses in `Head :- Body` form, for listing.
    pub fn clauses(&self) -> [Term; 2] {
        let base = Term::compound(":-", vec![self.base.terms()[0].clone(), Term::atom("true")]);
        let recursive = Term::compound(":-", self.recursive.terms().to_vec());
        [base, recursive]
    }
}

/// Outcome of [`ProcedureStore::register_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub handle: ProcedureHandle,
    pub name: Atom,
    /// False when a procedure was already registered under the signature
    pub fresh: bool,
}

pub type Synthesizer<'a> =
    dyn FnMut(Atom) -> Result<GeneratedProcedure, SpecificationError> + 'a;

/// Where generated procedures are registered and looked up.
pub trait ProcedureStore: Send + Sync + fmt::Debug {
    fn lookup(&self, signature: &Signature) -> Option<ProcedureHandle>;

    /// Register the procedure built by `synthesize` under `signature`, unless
    /// one is already registered.
    fn register_with(
        &self,
        signature: Signature,
        synthesize: &mut Synthesizer<'_>,
    ) -> Result<Registration, SpecificationError>;

    fn get(&self, handle: ProcedureHandle) -> Option<Arc<GeneratedProcedure>>;

    fn resolve(&self, name: &str) -> Option<Arc<GeneratedProcedure>>;

    fn len(&self) -> usize;

    /// Registered procedures in registration order.
    fn procedures(&self) -> Vec<Arc<GeneratedProcedure>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    by_signature: IndexMap<Signature, ProcedureHandle, ahash::RandomState>,
    by_name: AHashMap<Atom, ProcedureHandle>,
    procedures: Vec<Arc<GeneratedProcedure>>,
}

impl CacheInner {
    fn existing(&self, signature: &Signature) -> Option<Registration> {
        let handle = *self.by_signature.get(signature)?;
        let procedure = self.procedures.get(handle.index())?;
        Some(Registration {
            handle,
            name: procedure.name.clone(),
            fresh: false,
        })
    }
}

/// Append-only procedure arena. Entries are never evicted or replaced.
#[derive(Debug)]
pub struct ProcedureCache {
    inner: RwLock<CacheInner>,

    /// Next procedure number
    next_id: parking_lot::Mutex<u32>,
}

static GLOBAL: Lazy<Arc<ProcedureCache>> = Lazy::new(|| Arc::new(ProcedureCache::new()));

impl ProcedureCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            next_id: parking_lot::Mutex::new(0),
        }
    }

    /// The process-wide store.
    pub fn global() -> Arc<ProcedureCache> {
        Arc::clone(&GLOBAL)
    }

    fn fresh_name(&self) -> Atom {
        let id = {
            let mut next = self.next_id.lock();
            let current = *next;
            *next += 1;
            current
        };
        Atom::from(format!("do__{id}"))
    }
}

impl Default for ProcedureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcedureStore for ProcedureCache {
    fn lookup(&self, signature: &Signature) -> Option<ProcedureHandle> {
        self.inner.read().by_signature.get(signature).copied()
    }

    fn register_with(
        &self,
        signature: Signature,
        synthesize: &mut Synthesizer<'_>,
    ) -> Result<Registration, SpecificationError> {
        // Try to find an existing procedure first (read lock only)
        {
            let inner = self.inner.read();
            if let Some(registration) = inner.existing(&signature) {
                return Ok(registration);
            }
        }

        // Synthesis may register nested loops, so it runs without the lock.
        let procedure = synthesize(self.fresh_name())?;

        let mut inner = self.inner.write();

        // Double-check in case another thread registered it meanwhile
        if let Some(registration) = inner.existing(&signature) {
            debug!(%signature, discarded = %procedure.name, "lost registration race");
            return Ok(registration);
        }

        let handle = ProcedureHandle(inner.procedures.len() as u32);
        let name = procedure.name.clone();
        debug!(%signature, %name, arity = procedure.arity, "registered loop procedure");
        inner.by_name.insert(name.clone(), handle);
        inner.by_signature.insert(signature, handle);
        inner.procedures.push(Arc::new(procedure));
        Ok(Registration {
            handle,
            name,
            fresh: true,
        })
    }

    fn get(&self, handle: ProcedureHandle) -> Option<Arc<GeneratedProcedure>> {
        self.inner.read().procedures.get(handle.index()).cloned()
    }

    fn resolve(&self, name: &str) -> Option<Arc<GeneratedProcedure>> {
        let inner = self.inner.read();
        let handle = inner.by_name.get(name)?;
        inner.procedures.get(handle.index()).cloned()
    }

    fn len(&self) -> usize {
        self.inner.read().procedures.len()
    }

    fn procedures(&self) -> Vec<Arc<GeneratedProcedure>> {
        self.inner.read().procedures.clone()
    }
}
