use fnv::FnvHashMap;
use std::sync::RwLock;

use shared_gl::error::{HookError, Result};
use shared_gl::util::write_log_file;

/// Names an interface whose instances share one dispatch table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceId(pub &'static str);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookStrategy {
    /// Symbol resolution is redirected to the interceptor; the driver code is left untouched.
    Export,
    /// A slot of a shared dispatch table is overwritten with the interceptor.
    VirtualSlot { interface: InterfaceId, slot: usize },
}

#[derive(Debug, Clone)]
pub struct HookRecord {
    pub original: usize,
    pub interceptor: usize,
    pub installed: bool,
    pub strategy: HookStrategy,
    /// Dispatch tables patched for a `VirtualSlot` record.
    pub(crate) tables: Vec<usize>,
}

/// Call-through handle for a hooked entry.  It always targets the pristine original, so it
/// stays valid after the hook is removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Trampoline(pub(crate) usize);

impl Trampoline {
    pub fn address(&self) -> usize {
        self.0
    }

    /// Reinterpret as a typed function pointer.
    ///
    /// # Safety
    /// `F` must be the exact function pointer type of the original entry.
    pub unsafe fn as_fn<F: Copy>(&self) -> F {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
        std::mem::transmute_copy(&self.0)
    }
}

#[derive(Default)]
pub(crate) struct RegistryTables {
    pub(crate) by_original: FnvHashMap<usize, HookRecord>,
    pub(crate) by_slot: FnvHashMap<(InterfaceId, usize), HookRecord>,
    /// interceptor -> pristine original
    pub(crate) by_interceptor: FnvHashMap<usize, usize>,
}

/// Owns every hook record for the life of the process.  Records are never removed;
/// uninstalling only clears `installed`.
pub struct HookRegistry {
    pub(crate) tables: RwLock<RegistryTables>,
}

lazy_static! {
    static ref HOOKS: HookRegistry = HookRegistry::new();
}

/// The process-wide registry used by the exported entry points.
pub fn hooks() -> &'static HookRegistry {
    &HOOKS
}

impl Default for HookRegistry {
    fn default() -> Self {
        HookRegistry::new()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        HookRegistry {
            tables: RwLock::new(RegistryTables::default()),
        }
    }

    /// Intercept an exported entry.  Re-installing the same pair succeeds and returns the same
    /// trampoline.
    pub fn install(&self, original: usize, interceptor: usize) -> Result<Trampoline> {
        if original == 0 || interceptor == 0 {
            return Err(HookError::UnsupportedEntry("null entry".to_owned()));
        }
        if original == interceptor {
            return Err(HookError::UnsupportedEntry(format!(
                "entry {:x} is its own interceptor",
                original
            )));
        }

        let mut tables = self.tables.write().map_err(|_err| HookError::GlobalLockError)?;
        if let Some(bound) = tables.by_interceptor.get(&interceptor) {
            if *bound != original {
                return Err(HookError::UnsupportedEntry(format!(
                    "interceptor {:x} already calls through to {:x}, can't also take {:x}",
                    interceptor, bound, original
                )));
            }
        }

        match tables.by_original.get_mut(&original) {
            Some(rec) if rec.installed && rec.interceptor == interceptor => {
                return Ok(Trampoline(original));
            }
            Some(rec) if rec.installed => {
                return Err(HookError::AlreadyInstalled);
            }
            Some(rec) => {
                rec.interceptor = interceptor;
                rec.installed = true;
            }
            None => {
                tables.by_original.insert(
                    original,
                    HookRecord {
                        original,
                        interceptor,
                        installed: true,
                        strategy: HookStrategy::Export,
                        tables: vec![],
                    },
                );
            }
        }
        tables.by_interceptor.insert(interceptor, original);
        Ok(Trampoline(original))
    }

    /// Reverse an export installation.  No-op if the entry was never installed.
    pub fn uninstall(&self, original: usize) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_err| HookError::GlobalLockError)?;
        if let Some(rec) = tables.by_original.get_mut(&original) {
            rec.installed = false;
        }
        Ok(())
    }

    /// Address symbol resolution should hand out for `original`.
    pub fn redirect(&self, original: usize) -> usize {
        match self.tables.read() {
            Ok(tables) => match tables.by_original.get(&original) {
                Some(rec) if rec.installed => rec.interceptor,
                _ => original,
            },
            Err(_) => original,
        }
    }

    pub fn trampoline_for(&self, interceptor: usize) -> Option<Trampoline> {
        let tables = self.tables.read().ok()?;
        tables.by_interceptor.get(&interceptor).map(|orig| Trampoline(*orig))
    }

    /// Trampoline for `interceptor`, installing it on first use against the entry `resolve`
    /// finds.  If a different interceptor already holds that entry the pristine address is
    /// still safe to call, so it is returned anyway.
    pub fn call<F>(&self, interceptor: usize, resolve: F) -> Option<Trampoline>
    where
        F: FnOnce() -> Option<usize>,
    {
        if let Some(tramp) = self.trampoline_for(interceptor) {
            return Some(tramp);
        }
        let original = resolve()?;
        match self.install(original, interceptor) {
            Ok(tramp) => Some(tramp),
            Err(HookError::AlreadyInstalled) => {
                write_log_file(&format!(
                    "Warning: entry {:x} is intercepted elsewhere, calling it directly",
                    original
                ));
                Some(Trampoline(original))
            }
            Err(e) => {
                write_log_file(&format!(
                    "Error: failed to install interceptor {:x} on {:x}: {:?}",
                    interceptor, original, e
                ));
                None
            }
        }
    }

    pub fn is_installed(&self, original: usize) -> bool {
        self.record(original).map(|r| r.installed).unwrap_or(false)
    }

    pub fn record(&self, original: usize) -> Option<HookRecord> {
        let tables = self.tables.read().ok()?;
        tables.by_original.get(&original).cloned()
    }
}
