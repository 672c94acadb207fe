/*
Call-through to the real driver.  Every exported entry resolves its original lazily, by name, the
first time it runs; the hook registry caches the binding so later calls are a single map lookup.
 */
use fnv::FnvHashMap;
use std::sync::{Arc, RwLock};

use hook_registry::hooks;
use shared_gl::util::write_log_file;

/// The module that holds the real entry points.
pub trait DriverModule: Send + Sync {
    /// Address of `name`, or None if the driver doesn't have it.
    fn resolve(&self, name: &str) -> Option<usize>;
}

lazy_static! {
    static ref DRIVER: RwLock<Option<Arc<dyn DriverModule>>> = RwLock::new(None);
    static ref DRIVER_FNS: RwLock<FnvHashMap<String, usize>> = RwLock::new(FnvHashMap::default());
}

/// Replace the driver used for lazy resolution.  Entries that already resolved keep their
/// binding.
pub fn set_driver(driver: Arc<dyn DriverModule>) {
    match DRIVER.write() {
        Ok(mut d) => *d = Some(driver),
        Err(_) => write_log_file("Error: driver lock poisoned, can't replace driver"),
    }
}

fn driver() -> Option<Arc<dyn DriverModule>> {
    if let Ok(d) = DRIVER.read() {
        if let Some(d) = d.as_ref() {
            return Some(d.clone());
        }
    }
    let loaded = load_default_driver()?;
    let mut d = DRIVER.write().ok()?;
    // someone may have set one while we were loading
    Some(d.get_or_insert(loaded).clone())
}

fn resolve(name: &str) -> Option<usize> {
    let addr = driver()?.resolve(name);
    if addr.is_none() {
        write_log_file(&format!("Warning: driver has no entry named {}", name));
    }
    addr
}

/// The original for `interceptor`, installing it on first use against the driver entry named
/// `name`.
///
/// # Safety
/// `F` must be the function pointer type of the entry.
pub unsafe fn original<F: Copy>(interceptor: usize, name: &str) -> Option<F> {
    let tramp = hooks().call(interceptor, || resolve(name))?;
    Some(tramp.as_fn::<F>())
}

/// A driver entry we call for our own purposes (state queries) rather than on behalf of the host.
///
/// # Safety
/// `F` must be the function pointer type of the entry.
pub unsafe fn driver_fn<F: Copy>(name: &str) -> Option<F> {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
    let cached = DRIVER_FNS.read().ok().and_then(|m| m.get(name).copied());
    let addr = match cached {
        Some(a) => a,
        None => {
            let a = resolve(name)?;
            if let Ok(mut m) = DRIVER_FNS.write() {
                m.insert(name.to_owned(), a);
            }
            a
        }
    };
    Some(std::mem::transmute_copy(&addr))
}

/// Resolve the original of hook `$hook` (typed `$fnty`), or log and return `$fail` from the
/// enclosing function.
macro_rules! real_fn {
    ($hook:ident, $fnty:ty) => {
        real_fn!($hook, $fnty, ())
    };
    ($hook:ident, $fnty:ty, $fail:expr) => {
        match crate::dispatch::original::<$fnty>($hook as usize, stringify!($hook)) {
            Some(f) => f,
            None => {
                shared_gl::util::write_log_file(&format!(
                    "Error: can't call through {}, original not found",
                    stringify!($hook)
                ));
                return $fail;
            }
        }
    };
}

#[cfg(windows)]
mod system {
    use super::DriverModule;
    use shared_gl::defs_gl::GetProcAddressFn;
    use shared_gl::util::write_log_file;
    use std::ffi::CString;

    /// The real `opengl32.dll` from the system directory.
    pub struct SystemDriver {
        module: usize,
        get_proc_address: Option<GetProcAddressFn>,
    }

    impl SystemDriver {
        pub fn load() -> Option<Self> {
            let path = match util::system_module_path("opengl32.dll") {
                Ok(p) => p,
                Err(e) => {
                    write_log_file(&format!("Error: can't locate system opengl32.dll: {:?}", e));
                    return None;
                }
            };
            let module = match util::load_lib(&path) {
                Ok(m) => m,
                Err(e) => {
                    write_log_file(&format!("Error: failed to load {}: {:?}", path, e));
                    return None;
                }
            };
            write_log_file(&format!("loaded driver module {}", path));
            let get_proc_address = util::get_proc_address(module, "wglGetProcAddress")
                .ok()
                .map(|p| unsafe { std::mem::transmute::<_, GetProcAddressFn>(p) });
            Some(SystemDriver {
                module: module as usize,
                get_proc_address,
            })
        }
    }

    impl DriverModule for SystemDriver {
        fn resolve(&self, name: &str) -> Option<usize> {
            if let Ok(p) = util::get_proc_address(self.module as _, name) {
                return Some(p as usize);
            }
            // extensions only come from the ICD, and only with a context current
            let gpa = self.get_proc_address?;
            let cname = CString::new(name).ok()?;
            let p = unsafe { gpa(cname.as_ptr()) } as isize;
            match p {
                0 | 1 | 2 | 3 | -1 => None,
                _ => Some(p as usize),
            }
        }
    }
}

#[cfg(windows)]
fn load_default_driver() -> Option<Arc<dyn DriverModule>> {
    system::SystemDriver::load().map(|d| Arc::new(d) as Arc<dyn DriverModule>)
}

#[cfg(not(windows))]
fn load_default_driver() -> Option<Arc<dyn DriverModule>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use shared_gl::defs_gl::GetIntegervFn;

    #[test]
    fn test_driver_fn_caches() {
        let _t = test_support::setup();
        let f: GetIntegervFn = unsafe { driver_fn("glGetIntegerv") }.unwrap();
        let again: GetIntegervFn = unsafe { driver_fn("glGetIntegerv") }.unwrap();
        assert_eq!(f as usize, again as usize);
        assert!(unsafe { driver_fn::<GetIntegervFn>("glNotARealEntry") }.is_none());
    }

    #[test]
    fn test_original_binds_interceptor() {
        let _t = test_support::setup();
        let interceptor = crate::hook_gl::glDrawArrays as usize;
        let f = unsafe { original::<shared_gl::defs_gl::DrawArraysFn>(interceptor, "glDrawArrays") }.unwrap();
        assert_eq!(Some(f as usize), test_support::fake_address("glDrawArrays"));
        assert_eq!(hooks().redirect(f as usize), interceptor);
    }
}
