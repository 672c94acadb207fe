/*
Runtime lifecycle driven by the context entry points: make-current creates or retains a runtime
for the surface, deactivation releases it, present detects resizes and runs the frame, and
context deletion unlinks sharing.  Driver calls and runtime work always happen with the process
lock released.
 */
use std::sync::{Arc, Mutex};

use runtime::depth::DepthCandidate;
use runtime::Runtime;
use shared_gl::error::{HookError, Result};
use shared_gl::types::{ContextHandle, FrameRect, SurfaceHandle};
use shared_gl::util::write_log_file;

use crate::global_state::{ProcessState, RuntimeRef, SharedRuntime};
use crate::host::HostPlatform;

#[derive(Debug, PartialEq, Eq)]
pub enum Activation {
    Created,
    Retained(u32),
    /// No runtime for this surface; the host keeps rendering undecorated.
    Skipped(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct PresentReport {
    pub resized: bool,
    /// The runtime saw a usable size this frame; false while it waits for one.
    pub initialized: bool,
    pub depth: Option<DepthCandidate>,
}

fn teardown(runtime: SharedRuntime) {
    let mut rt = runtime.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let surface = rt.surface();
    rt.retire();
    write_log_file(&format!("destroyed runtime for surface {:x}", surface.0));
}

/// Drop one reference to the surface's runtime, tearing it down at zero.  `next` is the surface
/// being made current in its place: when that is an off-screen buffer the runtime is kept at zero
/// so the host can come back to the window without a rebuild.  Returns the remaining count, or
/// None if the surface had no runtime.
pub fn deactivate(state: &ProcessState, surface: SurfaceHandle, next: SurfaceHandle) -> Result<Option<u32>> {
    if surface.is_null() {
        return Ok(None);
    }
    let released = {
        let mut tables = state.lock()?;
        let remaining = match tables.runtimes.get_mut(&surface) {
            None => return Ok(None),
            Some(r) => {
                r.reference_count = r.reference_count.saturating_sub(1);
                r.reference_count
            }
        };
        if remaining > 0 {
            return Ok(Some(remaining));
        }
        if tables.offscreen.contains(&next) {
            write_log_file(&format!(
                "keeping runtime for surface {:x} while off-screen surface {:x} is current",
                surface.0, next.0
            ));
            return Ok(Some(0));
        }
        let released = tables.runtimes.remove(&surface);
        if let Some(r) = released.as_ref() {
            let window = r.window;
            if !tables.runtimes.values().any(|other| other.window == window) {
                tables.frame_rects.remove(&window);
            }
        }
        released
    };
    if let Some(r) = released {
        teardown(r.runtime);
    }
    Ok(Some(0))
}

/// Bind `context` on `surface` to a runtime, creating one when the surface is eligible.
pub fn activate(
    state: &ProcessState,
    host: &dyn HostPlatform,
    surface: SurfaceHandle,
    context: ContextHandle,
) -> Result<Activation> {
    if surface.is_null() || context.is_null() {
        return Ok(Activation::Skipped("null surface or context".to_owned()));
    }

    let root = {
        let mut tables = state.lock()?;
        if tables.offscreen.contains(&surface) {
            return Ok(Activation::Skipped("off-screen surface".to_owned()));
        }
        if let Some(r) = tables.runtimes.get_mut(&surface) {
            r.reference_count += 1;
            return Ok(Activation::Retained(r.reference_count));
        }
        tables.sharing.resolve_root(context)
    };

    let window = match host.window_for_surface(surface) {
        Some(w) if !w.is_null() => w,
        _ => return Ok(Activation::Skipped("surface has no window".to_owned())),
    };

    let settings = state.settings();
    match host.context_version() {
        Some(v) if v >= settings.capability_floor => {}
        v => {
            return Ok(Activation::Skipped(format!(
                "context version {:?} is below the required {}",
                v, settings.capability_floor
            )))
        }
    }

    if !host.window_has_own_dc(window) {
        write_log_file(&format!(
            "Warning: window {:x} has no private device context (CS_OWNDC), surfaces may change between frames",
            window.0
        ));
    }

    let runtime = Runtime::new(
        surface,
        root,
        host.create_effects(surface),
        settings.effect_source.clone(),
        settings.depth_detection,
    );

    let mut tables = state.lock()?;
    // another thread may have raced us here; ours was never initialized so it can just drop
    if let Some(r) = tables.runtimes.get_mut(&surface) {
        r.reference_count += 1;
        return Ok(Activation::Retained(r.reference_count));
    }
    tables.runtimes.insert(
        surface,
        RuntimeRef {
            runtime: Arc::new(Mutex::new(runtime)),
            reference_count: 1,
            window,
        },
    );
    // zero size forces the first present to initialize at the real size
    tables.frame_rects.insert(window, FrameRect::default());
    write_log_file(&format!(
        "created runtime for surface {:x} window {:x} context {:x} share root {:x}",
        surface.0, window.0, context.0, root.0
    ));
    Ok(Activation::Created)
}

/// Full make-current sequence around the real driver call.  `previous` is the calling
/// thread's current (surface, context) before the call.
pub fn make_current<F>(
    state: &ProcessState,
    host: &dyn HostPlatform,
    previous: (SurfaceHandle, ContextHandle),
    surface: SurfaceHandle,
    context: ContextHandle,
    driver_make_current: F,
) -> bool
where
    F: FnOnce() -> bool,
{
    if previous == (surface, context) {
        return true;
    }

    if !previous.0.is_null() && !previous.1.is_null() {
        if let Err(e) = deactivate(state, previous.0, surface) {
            write_log_file(&format!(
                "Error: failed to release runtime for surface {:x}: {:?}",
                previous.0 .0, e
            ));
        }
    }

    if !driver_make_current() {
        return false;
    }

    if context.is_null() {
        return true;
    }

    match activate(state, host, surface, context) {
        Ok(Activation::Skipped(why)) => write_log_file(&format!(
            "no runtime for surface {:x} context {:x}: {}",
            surface.0, context.0, why
        )),
        Ok(_) => {}
        Err(e) => write_log_file(&format!(
            "Error: failed to activate runtime for surface {:x}: {:?}",
            surface.0, e
        )),
    }
    true
}

/// Delete a context: release it first if it is current on this thread, then unlink it from the
/// sharing forest.
pub fn delete_context<F>(
    state: &ProcessState,
    host: &dyn HostPlatform,
    current: (SurfaceHandle, ContextHandle),
    context: ContextHandle,
    driver_release_current: F,
) -> Result<()>
where
    F: FnOnce() -> bool,
{
    if !context.is_null() && current.1 == context {
        make_current(
            state,
            host,
            current,
            SurfaceHandle::NULL,
            ContextHandle::NULL,
            driver_release_current,
        );
    }
    state.forget_context(context)
}

/// Per-swap work: detect a resize from the window's client size, reinitialize if needed, then
/// run the frame.  Returns None when the surface has no runtime.
pub fn present(
    state: &ProcessState,
    host: &dyn HostPlatform,
    surface: SurfaceHandle,
) -> Result<Option<PresentReport>> {
    let window = match host.window_for_surface(surface) {
        Some(w) => w,
        None => return Ok(None),
    };
    let rect = host.client_rect(window);

    let (runtime, resized) = {
        let mut tables = state.lock()?;
        let runtime = match tables.runtimes.get(&surface) {
            Some(r) => r.runtime.clone(),
            None => return Ok(None),
        };
        let prev = tables.frame_rects.entry(window).or_default();
        let resized = *prev != rect;
        if resized {
            *prev = rect;
        }
        (runtime, resized)
    };

    let mut rt = runtime.lock().map_err(|_err| HookError::GlobalLockError)?;
    if rt.is_retired() {
        // torn down by another thread after we looked it up; the next present sees the map
        write_log_file(&format!(
            "surface {:x}: runtime retired during present, retrying next frame",
            surface.0
        ));
        return Ok(None);
    }

    if resized {
        write_log_file(&format!(
            "surface {:x}: window {:x} resized to {}x{}",
            surface.0, window.0, rect.width, rect.height
        ));
        rt.on_reset();
        if !rect.is_degenerate() {
            if let Err(e) = rt.on_init(rect.width, rect.height) {
                write_log_file(&format!(
                    "Error: failed to initialize runtime for surface {:x}: {:?}",
                    surface.0, e
                ));
                drop(rt);
                // forget the size so the next present tries again
                let mut tables = state.lock()?;
                tables.frame_rects.insert(window, FrameRect::default());
                return Ok(Some(PresentReport {
                    resized,
                    initialized: false,
                    depth: None,
                }));
            }
        }
    }

    let initialized = rt.is_initialized();
    let depth = rt.on_present();
    Ok(Some(PresentReport {
        resized,
        initialized,
        depth,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global_state::RuntimeSettings;
    use runtime::effects::{Diagnostics, EffectSubsystem, Technique, TechniqueSet};
    use shared_gl::types::{GlVersion, ViewHandle, WindowHandle};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingEffects {
        teardowns: Arc<AtomicU32>,
    }

    impl EffectSubsystem for CountingEffects {
        fn compile(&mut self, _source: &str, _pragmas: &[String]) -> std::result::Result<TechniqueSet, Diagnostics> {
            Ok(vec![])
        }
        fn apply(&mut self, _technique: &Technique) {}
        fn on_resize(&mut self, _width: u32, _height: u32) {}
        fn on_teardown(&mut self) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeHost {
        rect: Mutex<FrameRect>,
        version: GlVersion,
        created: AtomicU32,
        teardowns: Arc<AtomicU32>,
    }

    impl FakeHost {
        fn new(version: GlVersion) -> Self {
            FakeHost {
                rect: Mutex::new(FrameRect::new(1920, 1080)),
                version,
                created: AtomicU32::new(0),
                teardowns: Arc::new(AtomicU32::new(0)),
            }
        }
        fn resize(&self, w: u32, h: u32) {
            *self.rect.lock().unwrap() = FrameRect::new(w, h);
        }
    }

    // surfaces below 0x1000 are memory surfaces with no window
    impl HostPlatform for FakeHost {
        fn window_for_surface(&self, surface: SurfaceHandle) -> Option<WindowHandle> {
            if surface.0 >= 0x1000 {
                Some(WindowHandle(surface.0 + 1))
            } else {
                None
            }
        }
        fn client_rect(&self, _window: WindowHandle) -> FrameRect {
            *self.rect.lock().unwrap()
        }
        fn context_version(&self) -> Option<GlVersion> {
            Some(self.version)
        }
        fn create_effects(&self, _surface: SurfaceHandle) -> Box<dyn EffectSubsystem> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingEffects {
                teardowns: self.teardowns.clone(),
            })
        }
    }

    const S: SurfaceHandle = SurfaceHandle(0x1000);
    const MEM: SurfaceHandle = SurfaceHandle(0x10);
    const A: ContextHandle = ContextHandle(0xA);
    const NONE: (SurfaceHandle, ContextHandle) = (SurfaceHandle::NULL, ContextHandle::NULL);

    fn new_state() -> ProcessState {
        ProcessState::new(RuntimeSettings::default())
    }

    #[test]
    fn test_refcount_scenario() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));

        // A current on S, then again on S from a second thread
        assert!(make_current(&state, &host, NONE, S, A, || true));
        assert_eq!(state.reference_count(S), 1);
        assert!(make_current(&state, &host, NONE, S, A, || true));
        assert_eq!(state.reference_count(S), 2);
        assert_eq!(host.created.load(Ordering::SeqCst), 1);

        // first present initializes it
        let report = present(&state, &host, S).unwrap().unwrap();
        assert!(report.resized && report.initialized);

        assert!(make_current(&state, &host, (S, A), SurfaceHandle::NULL, ContextHandle::NULL, || true));
        assert_eq!(state.reference_count(S), 1);
        assert!(state.runtime_for(S).is_some());
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 0);

        let rt = state.runtime_for(S).unwrap();
        assert!(make_current(&state, &host, (S, A), SurfaceHandle::NULL, ContextHandle::NULL, || true));
        assert_eq!(state.reference_count(S), 0);
        assert!(state.runtime_for(S).is_none());
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 1);
        // teardown finished before make_current returned
        assert!(rt.lock().unwrap().is_retired());
        assert!(state.lock().unwrap().frame_rects.is_empty());
    }

    #[test]
    fn test_offscreen_switch_keeps_window_runtime() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        let pbuf = SurfaceHandle(0x5100);
        state.add_offscreen_surface(pbuf).unwrap();

        assert!(make_current(&state, &host, NONE, S, A, || true));
        let report = present(&state, &host, S).unwrap().unwrap();
        assert!(report.initialized);
        let rt = state.runtime_for(S).unwrap();

        // render to the pbuffer with the same context
        assert!(make_current(&state, &host, (S, A), pbuf, A, || true));
        assert_eq!(state.reference_count(S), 0);
        assert!(state.runtime_for(S).is_some());
        assert!(state.runtime_for(pbuf).is_none());
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 0);

        // back on the window: same runtime, still initialized
        assert!(make_current(&state, &host, (pbuf, A), S, A, || true));
        assert_eq!(state.reference_count(S), 1);
        assert!(Arc::ptr_eq(&rt, &state.runtime_for(S).unwrap()));
        assert_eq!(host.created.load(Ordering::SeqCst), 1);
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 0);
        let report = present(&state, &host, S).unwrap().unwrap();
        assert!(!report.resized && report.initialized);

        // releasing to nothing still tears it down
        assert!(make_current(&state, &host, (S, A), SurfaceHandle::NULL, ContextHandle::NULL, || true));
        assert!(state.runtime_for(S).is_none());
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_pair_is_noop() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 3));
        assert!(make_current(&state, &host, NONE, S, A, || true));
        let mut driver_called = false;
        assert!(make_current(&state, &host, (S, A), S, A, || {
            driver_called = true;
            true
        }));
        assert!(!driver_called);
        assert_eq!(state.reference_count(S), 1);
        assert_eq!(host.created.load(Ordering::SeqCst), 1);
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ineligible_surfaces_stay_absent() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        assert!(make_current(&state, &host, NONE, MEM, A, || true));
        assert_eq!(state.reference_count(MEM), 0);

        let pbuf = SurfaceHandle(0x2000);
        state.add_offscreen_surface(pbuf).unwrap();
        match activate(&state, &host, pbuf, A).unwrap() {
            Activation::Skipped(_) => {}
            a => panic!("expected skip, got {:?}", a),
        }

        let old = FakeHost::new(GlVersion::new(3, 3));
        match activate(&state, &old, S, A).unwrap() {
            Activation::Skipped(why) => assert!(why.contains("below")),
            a => panic!("expected skip, got {:?}", a),
        }
        assert!(state.runtime_for(S).is_none());

        // a failed driver call never creates anything
        assert!(!make_current(&state, &host, NONE, S, A, || false));
        assert!(state.runtime_for(S).is_none());
        // deactivating a surface that was never active is harmless
        assert_eq!(deactivate(&state, S, SurfaceHandle::NULL).unwrap(), None);
    }

    #[test]
    fn test_runtime_bound_to_share_root() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        state.register_context(ContextHandle(1), None).unwrap();
        state.register_context(ContextHandle(2), Some(ContextHandle(1))).unwrap();
        assert_eq!(activate(&state, &host, S, ContextHandle(2)).unwrap(), Activation::Created);
        let rt = state.runtime_for(S).unwrap();
        assert_eq!(rt.lock().unwrap().share_root(), ContextHandle(1));
    }

    #[test]
    fn test_resize_and_degenerate_size() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        assert_eq!(activate(&state, &host, S, A).unwrap(), Activation::Created);

        let r = present(&state, &host, S).unwrap().unwrap();
        assert!(r.resized && r.initialized);
        assert_eq!(r.depth.map(|d| d.view), Some(ViewHandle::DEFAULT));

        let r = present(&state, &host, S).unwrap().unwrap();
        assert!(!r.resized && r.initialized);

        // minimized: torn down and left pending
        host.resize(0, 0);
        let r = present(&state, &host, S).unwrap().unwrap();
        assert!(r.resized && !r.initialized);
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 1);
        let r = present(&state, &host, S).unwrap().unwrap();
        assert!(!r.resized && !r.initialized);

        host.resize(1280, 720);
        let r = present(&state, &host, S).unwrap().unwrap();
        assert!(r.resized && r.initialized);
        let rt = state.runtime_for(S).unwrap();
        assert_eq!(rt.lock().unwrap().size(), (1280, 720));
        // recreated in place, still one runtime with one reference
        assert_eq!(state.reference_count(S), 1);
        assert_eq!(host.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_present_after_retire_is_skipped() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        activate(&state, &host, S, A).unwrap();
        let rt = state.runtime_for(S).unwrap();
        // simulate another thread retiring it while the map still has it
        rt.lock().unwrap().retire();
        assert_eq!(present(&state, &host, S).unwrap(), None);
        assert_eq!(present(&state, &host, MEM).unwrap(), None);
    }

    #[test]
    fn test_delete_current_context() {
        let state = new_state();
        let host = FakeHost::new(GlVersion::new(4, 6));
        state.register_context(A, None).unwrap();
        state.register_context(ContextHandle(0xB), Some(A)).unwrap();
        assert!(make_current(&state, &host, NONE, S, A, || true));

        let mut released = false;
        delete_context(&state, &host, (S, A), A, || {
            released = true;
            true
        })
        .unwrap();
        assert!(released);
        assert!(state.runtime_for(S).is_none());
        assert_eq!(state.resolve_share_root(ContextHandle(0xB)), ContextHandle(0xB));

        // deleting a context that isn't current doesn't touch the driver
        delete_context(&state, &host, NONE, ContextHandle(0xB), || panic!("not current")).unwrap();
    }

    #[test]
    fn test_threads_share_one_runtime() {
        let state = Arc::new(new_state());
        let host = Arc::new(FakeHost::new(GlVersion::new(4, 6)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                let host = host.clone();
                std::thread::spawn(move || {
                    assert!(make_current(&*state, &*host, NONE, S, A, || true));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(state.reference_count(S), 8);
        for _ in 0..8 {
            deactivate(&state, S, SurfaceHandle::NULL).unwrap();
        }
        assert!(state.runtime_for(S).is_none());
        assert_eq!(host.teardowns.load(Ordering::SeqCst), 0);
    }
}
