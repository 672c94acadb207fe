#[cfg(windows)]
use winapi::shared::minwindef::{FARPROC, HMODULE};
#[cfg(windows)]
use winapi::um::libloaderapi::{FreeLibrary, GetProcAddress, LoadLibraryW};

use std::path::PathBuf;

use shared_gl::error::*;

pub mod conf;

#[cfg(windows)]
pub unsafe fn protect_memory(
    target: *mut std::os::raw::c_void,
    size: usize,
    protection: u32,
) -> Result<u32> {
    let process = winapi::um::processthreadsapi::GetCurrentProcess();
    let mut old_protection = winapi::um::winnt::PAGE_READWRITE;
    if winapi::um::memoryapi::VirtualProtectEx(
        process,
        target as *mut winapi::ctypes::c_void,
        size,
        protection,
        (&mut old_protection) as *mut u32,
    ) > 0
    {
        Ok(old_protection)
    } else {
        Err(HookError::ProtectFailed)
    }
}

#[cfg(windows)]
pub unsafe fn unprotect_memory(target: *mut std::os::raw::c_void, size: usize) -> Result<u32> {
    protect_memory(target, size, winapi::um::winnt::PAGE_READWRITE)
}

// Off Windows the only tables ever patched are heap allocations made by tests, which are
// already writable.
#[cfg(not(windows))]
pub unsafe fn protect_memory(
    _target: *mut std::os::raw::c_void,
    _size: usize,
    protection: u32,
) -> Result<u32> {
    Ok(protection)
}

#[cfg(not(windows))]
pub unsafe fn unprotect_memory(target: *mut std::os::raw::c_void, size: usize) -> Result<u32> {
    protect_memory(target, size, 0)
}

#[cfg(windows)]
pub fn load_lib(name: &str) -> Result<HMODULE> {
    let wide: Vec<u16> = to_wide_str(name);
    let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
    if handle.is_null() {
        Err(HookError::LoadLibFailed(name.to_owned()))
    } else {
        Ok(handle)
    }
}

#[cfg(windows)]
pub fn unload_lib(h: HMODULE) -> Result<()> {
    if unsafe { FreeLibrary(h) } == 0 {
        Err(HookError::LoadLibFailed(format!(
            "Unload of the library {:?} failed",
            h
        )))
    } else {
        Ok(())
    }
}

#[cfg(windows)]
pub fn get_proc_address(h: HMODULE, name: &str) -> Result<FARPROC> {
    use std::ffi::CString;

    if h.is_null() {
        return Err(HookError::GetProcAddressFailed("null handle".to_owned()));
    }
    let csname = CString::new(name)?;
    let addr = unsafe { GetProcAddress(h, csname.as_ptr()) };
    if addr.is_null() {
        Err(HookError::GetProcAddressFailed(format!(
            "{} not found in module",
            name
        )))
    } else {
        Ok(addr)
    }
}

#[cfg(windows)]
pub fn to_wide_str(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::iter::once;
    use std::os::windows::ffi::OsStrExt;

    OsStr::new(s).encode_wide().chain(once(0)).collect()
}

#[cfg(windows)]
pub fn from_wide_str(ws: &[u16]) -> Result<String> {
    use std::ffi::OsString;
    use std::os::windows::prelude::*;

    let end = ws.iter().position(|c| *c == 0).unwrap_or(ws.len());
    let s = OsString::from_wide(&ws[0..end]).into_string()?;
    Ok(s)
}

/// Full path of a module in the system directory, e.g. the real `opengl32.dll`.  The proxy
/// module shares its name, so the driver must never be loaded by bare name.
#[cfg(windows)]
pub fn system_module_path(name: &str) -> Result<String> {
    use winapi::um::sysinfoapi::GetSystemDirectoryW;

    let mut buf: Vec<u16> = vec![0; 1024];
    let len = unsafe { GetSystemDirectoryW(buf.as_mut_ptr(), buf.len() as u32) };
    if len == 0 || len as usize >= buf.len() {
        return Err(HookError::WinApiError(format!(
            "GetSystemDirectoryW failed: {}",
            len
        )));
    }
    let dir = from_wide_str(&buf[0..len as usize])?;
    let mut path = PathBuf::from(dir);
    path.push(name);
    Ok(path.to_string_lossy().into_owned())
}

/// Path of the host executable.
pub fn get_module_name() -> Result<String> {
    let exe = std::env::current_exe()?;
    exe.to_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| HookError::ModuleNameError(format!("non-unicode module path: {:?}", exe)))
}

/// Directory holding `glhook.yaml` and, by default, the `Logs` folder.  `GLHOOK_ROOT`
/// overrides the directory of the host executable.
pub fn hook_root_dir() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("GLHOOK_ROOT") {
        if !root.is_empty() {
            return Ok(PathBuf::from(root));
        }
    }
    let exe = PathBuf::from(get_module_name()?);
    exe.parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| HookError::ModuleNameError(format!("no parent directory for {:?}", exe)))
}

/// File stem of the host executable, used to name its log file.
pub fn module_stem() -> String {
    get_module_name()
        .ok()
        .and_then(|name| {
            PathBuf::from(name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}
