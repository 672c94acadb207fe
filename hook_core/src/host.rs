use std::sync::{Arc, RwLock};

use global_state::host::HostPlatform;
use runtime::effects::{EffectSubsystem, NoEffects};
use shared_gl::defs_gl::DWORD;
use shared_gl::types::{FrameRect, GlVersion, SurfaceHandle, WindowHandle};
use shared_gl::util::write_log_file;

lazy_static! {
    static ref HOST: RwLock<Option<Arc<dyn HostPlatform>>> = RwLock::new(None);
}

pub fn set_host(host: Arc<dyn HostPlatform>) {
    match HOST.write() {
        Ok(mut h) => *h = Some(host),
        Err(_) => write_log_file("Error: host lock poisoned, can't replace host"),
    }
}

/// The platform adapter the lifecycle calls back into.
pub fn host() -> Arc<dyn HostPlatform> {
    if let Ok(h) = HOST.read() {
        if let Some(h) = h.as_ref() {
            return h.clone();
        }
    }
    let default: Arc<dyn HostPlatform> = Arc::new(DefaultHost {});
    match HOST.write() {
        Ok(mut h) => h.get_or_insert(default).clone(),
        Err(_) => default,
    }
}

#[cfg(windows)]
pub type DefaultHost = win::WinHost;
#[cfg(not(windows))]
pub type DefaultHost = HeadlessHost;

/// No windows exist, so no surface is ever eligible for a runtime.
pub struct HeadlessHost;

impl HostPlatform for HeadlessHost {
    fn window_for_surface(&self, _surface: SurfaceHandle) -> Option<WindowHandle> {
        None
    }
    fn client_rect(&self, _window: WindowHandle) -> FrameRect {
        FrameRect::default()
    }
    fn context_version(&self) -> Option<GlVersion> {
        None
    }
    fn create_effects(&self, _surface: SurfaceHandle) -> Box<dyn EffectSubsystem> {
        Box::new(NoEffects)
    }
}

#[cfg(windows)]
mod win {
    use super::*;
    use shared_gl::defs_gl::{GetIntegervFn, GLint, GL_MAJOR_VERSION, GL_MINOR_VERSION};
    use winapi::shared::windef::{HDC, HWND, RECT};
    use winapi::um::winuser::{GetClassLongPtrW, GetClientRect, WindowFromDC, CS_OWNDC, GCL_STYLE};

    pub struct WinHost;

    impl HostPlatform for WinHost {
        fn window_for_surface(&self, surface: SurfaceHandle) -> Option<WindowHandle> {
            let hwnd = unsafe { WindowFromDC(surface.as_ptr::<()>() as HDC) };
            if hwnd.is_null() {
                None
            } else {
                Some(WindowHandle::from_ptr(hwnd))
            }
        }

        fn client_rect(&self, window: WindowHandle) -> FrameRect {
            let mut rect: RECT = unsafe { std::mem::zeroed() };
            if unsafe { GetClientRect(window.as_ptr::<()>() as HWND, &mut rect) } == 0 {
                return FrameRect::default();
            }
            FrameRect::new(
                (rect.right - rect.left).max(0) as u32,
                (rect.bottom - rect.top).max(0) as u32,
            )
        }

        fn context_version(&self) -> Option<GlVersion> {
            let get: GetIntegervFn = unsafe { crate::dispatch::driver_fn("glGetIntegerv") }?;
            let mut major: GLint = 0;
            let mut minor: GLint = 0;
            unsafe {
                get(GL_MAJOR_VERSION, &mut major);
                get(GL_MINOR_VERSION, &mut minor);
            }
            // pre-3.0 contexts don't know these queries and leave the values alone
            if major <= 0 {
                return None;
            }
            Some(GlVersion::new(major, minor.max(0)))
        }

        fn create_effects(&self, _surface: SurfaceHandle) -> Box<dyn EffectSubsystem> {
            Box::new(NoEffects)
        }

        fn window_has_own_dc(&self, window: WindowHandle) -> bool {
            let style = unsafe { GetClassLongPtrW(window.as_ptr::<()>() as HWND, GCL_STYLE) };
            (style as u32 & CS_OWNDC) != 0
        }
    }
}

#[cfg(windows)]
pub fn set_last_error(code: DWORD) {
    unsafe { winapi::um::errhandlingapi::SetLastError(code) }
}

#[cfg(windows)]
pub fn get_last_error() -> DWORD {
    unsafe { winapi::um::errhandlingapi::GetLastError() }
}

#[cfg(not(windows))]
thread_local! {
    static LAST_ERROR: std::cell::Cell<DWORD> = std::cell::Cell::new(0);
}

#[cfg(not(windows))]
pub fn set_last_error(code: DWORD) {
    LAST_ERROR.with(|e| e.set(code))
}

#[cfg(not(windows))]
pub fn get_last_error() -> DWORD {
    LAST_ERROR.with(|e| e.get())
}
