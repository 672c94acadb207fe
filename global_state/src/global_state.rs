use fnv::{FnvHashMap, FnvHashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use runtime::{EffectSource, Runtime};
use shared_gl::error::{HookError, Result};
use shared_gl::types::{ContextHandle, FrameRect, GlVersion, SurfaceHandle, WindowHandle};
use shared_gl::util::write_log_file;

use crate::share::SharingForest;

pub type SharedRuntime = Arc<Mutex<Runtime>>;

pub struct RuntimeRef {
    pub runtime: SharedRuntime,
    pub reference_count: u32,
    pub window: WindowHandle,
}

/// Everything guarded by the process lock.  Nothing in here may call the driver.
#[derive(Default)]
pub struct ContextTables {
    pub runtimes: FnvHashMap<SurfaceHandle, RuntimeRef>,
    pub sharing: SharingForest,
    /// Surfaces handed out by wglGetPbufferDCARB.
    pub offscreen: FnvHashSet<SurfaceHandle>,
    pub frame_rects: FnvHashMap<WindowHandle, FrameRect>,
}

#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    pub capability_floor: GlVersion,
    pub depth_detection: bool,
    pub effect_source: Option<EffectSource>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            capability_floor: GlVersion::default(),
            depth_detection: true,
            effect_source: None,
        }
    }
}

pub struct ProcessState {
    tables: Mutex<ContextTables>,
    settings: RwLock<RuntimeSettings>,
}

lazy_static! {
    static ref PROCESS_STATE: ProcessState = ProcessState::new(RuntimeSettings::default());
}

/// Lives until the process exits.  Tests build their own `ProcessState` instead.
pub fn process_state() -> &'static ProcessState {
    &PROCESS_STATE
}

impl ProcessState {
    pub fn new(settings: RuntimeSettings) -> Self {
        ProcessState {
            tables: Mutex::new(ContextTables::default()),
            settings: RwLock::new(settings),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<ContextTables>> {
        self.tables.lock().map_err(|_err| HookError::GlobalLockError)
    }

    pub fn settings(&self) -> RuntimeSettings {
        match self.settings.read() {
            Ok(s) => s.clone(),
            Err(_) => RuntimeSettings::default(),
        }
    }

    pub fn set_settings(&self, settings: RuntimeSettings) -> Result<()> {
        let mut s = self.settings.write().map_err(|_err| HookError::GlobalLockError)?;
        *s = settings;
        Ok(())
    }

    pub fn runtime_for(&self, surface: SurfaceHandle) -> Option<SharedRuntime> {
        let tables = self.lock().ok()?;
        tables.runtimes.get(&surface).map(|r| r.runtime.clone())
    }

    pub fn reference_count(&self, surface: SurfaceHandle) -> u32 {
        match self.lock() {
            Ok(tables) => tables.runtimes.get(&surface).map(|r| r.reference_count).unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Run `f` on the surface's runtime, if it has one.  The process lock is released before
    /// the runtime is locked.  Returns false if there was no runtime or a lock was poisoned.
    pub fn with_runtime<F>(&self, surface: SurfaceHandle, f: F) -> bool
    where
        F: FnOnce(&mut Runtime),
    {
        let rt = match self.runtime_for(surface) {
            Some(rt) => rt,
            None => return false,
        };
        let locked = rt.lock();
        match locked {
            Ok(mut rt) => {
                f(&mut rt);
                true
            }
            Err(_) => false,
        }
    }

    pub fn add_offscreen_surface(&self, surface: SurfaceHandle) -> Result<()> {
        self.lock()?.offscreen.insert(surface);
        Ok(())
    }

    pub fn remove_offscreen_surface(&self, surface: SurfaceHandle) -> Result<()> {
        self.lock()?.offscreen.remove(&surface);
        Ok(())
    }

    pub fn is_offscreen(&self, surface: SurfaceHandle) -> bool {
        self.lock().map(|t| t.offscreen.contains(&surface)).unwrap_or(false)
    }

    /// Record a new context, optionally sharing with `share`.
    pub fn register_context(&self, ctx: ContextHandle, share: Option<ContextHandle>) -> Result<()> {
        let mut tables = self.lock()?;
        tables.sharing.add_root(ctx);
        match share {
            Some(parent) if !parent.is_null() => {
                tables.sharing.set_parent(ctx, parent)?;
                write_log_file(&format!(
                    "context {:x} shares with {:x} (root {:x})",
                    ctx.0,
                    parent.0,
                    tables.sharing.resolve_root(ctx).0
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// `child` starts sharing the resources of `parent`.
    pub fn share_lists(&self, parent: ContextHandle, child: ContextHandle) -> Result<()> {
        self.lock()?.sharing.set_parent(child, parent)
    }

    pub fn resolve_share_root(&self, ctx: ContextHandle) -> ContextHandle {
        match self.lock() {
            Ok(tables) => tables.sharing.resolve_root(ctx),
            Err(_) => ctx,
        }
    }

    pub fn forget_context(&self, ctx: ContextHandle) -> Result<()> {
        self.lock()?.sharing.remove(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::effects::NoEffects;

    #[test]
    fn test_with_runtime_misses_silently() {
        let state = ProcessState::new(RuntimeSettings::default());
        assert!(!state.with_runtime(SurfaceHandle(1), |_rt| panic!("no runtime expected")));
        assert_eq!(state.reference_count(SurfaceHandle(1)), 0);
    }

    #[test]
    fn test_with_runtime_reaches_runtime() {
        let state = ProcessState::new(RuntimeSettings::default());
        let rt = Runtime::new(SurfaceHandle(1), ContextHandle(2), Box::new(NoEffects), None, true);
        state.lock().unwrap().runtimes.insert(
            SurfaceHandle(1),
            RuntimeRef {
                runtime: Arc::new(Mutex::new(rt)),
                reference_count: 1,
                window: WindowHandle(3),
            },
        );
        let mut seen = None;
        assert!(state.with_runtime(SurfaceHandle(1), |rt| seen = Some(rt.share_root())));
        assert_eq!(seen, Some(ContextHandle(2)));
    }

    #[test]
    fn test_context_registration() {
        let state = ProcessState::new(RuntimeSettings::default());
        state.register_context(ContextHandle(1), None).unwrap();
        state.register_context(ContextHandle(2), Some(ContextHandle(1))).unwrap();
        state.register_context(ContextHandle(3), Some(ContextHandle(2))).unwrap();
        assert_eq!(state.resolve_share_root(ContextHandle(3)), ContextHandle(1));
        state.forget_context(ContextHandle(2)).unwrap();
        assert_eq!(state.resolve_share_root(ContextHandle(3)), ContextHandle(3));

        state.share_lists(ContextHandle(1), ContextHandle(4)).unwrap();
        assert_eq!(state.resolve_share_root(ContextHandle(4)), ContextHandle(1));
    }

    #[test]
    fn test_offscreen_set() {
        let state = ProcessState::new(RuntimeSettings::default());
        state.add_offscreen_surface(SurfaceHandle(9)).unwrap();
        assert!(state.is_offscreen(SurfaceHandle(9)));
        state.remove_offscreen_surface(SurfaceHandle(9)).unwrap();
        assert!(!state.is_offscreen(SurfaceHandle(9)));
    }
}
