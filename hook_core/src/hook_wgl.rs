/*
WGL entries.  Context creation and sharing feed the sharing forest, make-current and delete drive
the runtime lifecycle, swaps present the runtime, and requests for layer planes are refused
before they reach the driver.
 */
use std::ptr::null_mut;

use global_state::lifecycle;
use global_state::process_state;
use shared_gl::defs_gl::*;
use shared_gl::types::{ContextHandle, SurfaceHandle};
use shared_gl::util::write_log_file;

use crate::context_attribs::upgrade_attribs;
use crate::host::{get_last_error, host, set_last_error};
use crate::init::{config, is_active};
use crate::pixel_format::{attrib_pairs, check_attribs, check_descriptor, describe_attribs, describe_descriptor};

/// Log a failed driver call without disturbing the error code the host will read.
fn log_driver_failure(entry: &str) {
    let err = get_last_error();
    write_log_file(&format!("Warning: {} failed with {}", entry, error_name(err)));
    set_last_error(err);
}

fn log_lines(lines: Vec<String>) {
    for l in lines {
        write_log_file(&l);
    }
}

fn reject(entry: &str, why: &str, code: DWORD) {
    write_log_file(&format!("Warning: {}: {}", entry, why));
    set_last_error(code);
}

unsafe fn current_pair() -> (SurfaceHandle, ContextHandle) {
    (
        SurfaceHandle::from_ptr(wglGetCurrentDC()),
        ContextHandle::from_ptr(wglGetCurrentContext()),
    )
}

fn register_context(hglrc: HGLRC, share: HGLRC) {
    let ctx = ContextHandle::from_ptr(hglrc);
    let share = if share.is_null() {
        None
    } else {
        Some(ContextHandle::from_ptr(share))
    };
    if let Err(e) = process_state().register_context(ctx, share) {
        write_log_file(&format!("Error: failed to register context {:x}: {:?}", ctx.0, e));
    }
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetCurrentDC() -> HDC {
    let real = real_fn!(wglGetCurrentDC, GetCurrentDCFn, null_mut());
    real()
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetCurrentContext() -> HGLRC {
    let real = real_fn!(wglGetCurrentContext, GetCurrentContextFn, null_mut());
    real()
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglCreateContext(hdc: HDC) -> HGLRC {
    let real = real_fn!(wglCreateContext, CreateContextFn, null_mut());
    write_log_file(&format!("wglCreateContext({:?})", hdc));
    let hglrc = real(hdc);
    if hglrc.is_null() {
        log_driver_failure("wglCreateContext");
        return hglrc;
    }
    if is_active() {
        register_context(hglrc, null_mut());
    }
    write_log_file(&format!("> returned context {:?}", hglrc));
    hglrc
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglCreateLayerContext(hdc: HDC, iLayerPlane: INT) -> HGLRC {
    if iLayerPlane != 0 {
        reject(
            "wglCreateLayerContext",
            &format!("layer plane {} is not supported", iLayerPlane),
            ERROR_INVALID_PARAMETER,
        );
        return null_mut();
    }
    wglCreateContext(hdc)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglCreateContextAttribsARB(
    hdc: HDC,
    hShareContext: HGLRC,
    attribList: *const INT,
) -> HGLRC {
    let real = real_fn!(wglCreateContextAttribsARB, CreateContextAttribsARBFn, null_mut());
    let conf = config();
    if !conf.active {
        return real(hdc, hShareContext, attribList);
    }
    write_log_file(&format!(
        "wglCreateContextAttribsARB({:?}, {:?}, {:?})",
        hdc, hShareContext, attribList
    ));

    let pairs = attrib_pairs(attribList);
    let req = upgrade_attribs(&pairs, conf.capability_floor, conf.upgrade_context_version);
    if conf.log_pixel_formats {
        write_log_file("> attributes:");
        log_lines(describe_attribs(&pairs));
    }
    write_log_file(&format!(
        "> requesting {} context for version {}",
        if req.compatibility { "compatibility" } else { "core" },
        req.requested
    ));
    if req.upgraded {
        write_log_file(&format!(
            "Warning: replacing requested version {} with {}",
            req.requested, conf.capability_floor
        ));
    }

    let hglrc = real(hdc, hShareContext, req.attribs.as_ptr());
    if hglrc.is_null() {
        log_driver_failure("wglCreateContextAttribsARB");
        return hglrc;
    }
    register_context(hglrc, hShareContext);
    write_log_file(&format!("> returned context {:?}", hglrc));
    hglrc
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglShareLists(hglrc1: HGLRC, hglrc2: HGLRC) -> BOOL {
    let real = real_fn!(wglShareLists, ShareListsFn, FALSE);
    if real(hglrc1, hglrc2) == FALSE {
        log_driver_failure("wglShareLists");
        return FALSE;
    }
    if is_active() {
        let (parent, child) = (ContextHandle::from_ptr(hglrc1), ContextHandle::from_ptr(hglrc2));
        if let Err(e) = process_state().share_lists(parent, child) {
            write_log_file(&format!(
                "Warning: not tracking sharing of {:x} with {:x}: {:?}",
                child.0, parent.0, e
            ));
        }
    }
    TRUE
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglMakeCurrent(hdc: HDC, hglrc: HGLRC) -> BOOL {
    let real = real_fn!(wglMakeCurrent, MakeCurrentFn, FALSE);
    if !is_active() {
        return real(hdc, hglrc);
    }
    let previous = current_pair();
    let host = host();
    let ok = lifecycle::make_current(
        process_state(),
        &*host,
        previous,
        SurfaceHandle::from_ptr(hdc),
        ContextHandle::from_ptr(hglrc),
        || real(hdc, hglrc) != FALSE,
    );
    if ok {
        TRUE
    } else {
        log_driver_failure("wglMakeCurrent");
        FALSE
    }
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglDeleteContext(hglrc: HGLRC) -> BOOL {
    let real = real_fn!(wglDeleteContext, DeleteContextFn, FALSE);
    if is_active() {
        let make_current = crate::dispatch::original::<MakeCurrentFn>(wglMakeCurrent as usize, "wglMakeCurrent");
        let host = host();
        let release = || match make_current {
            Some(f) => f(null_mut(), null_mut()) != FALSE,
            None => false,
        };
        if let Err(e) = lifecycle::delete_context(
            process_state(),
            &*host,
            current_pair(),
            ContextHandle::from_ptr(hglrc),
            release,
        ) {
            write_log_file(&format!("Error: failed to forget context {:?}: {:?}", hglrc, e));
        }
    }
    let ok = real(hglrc);
    if ok == FALSE {
        log_driver_failure("wglDeleteContext");
    }
    ok
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglSwapBuffers(hdc: HDC) -> BOOL {
    let real = real_fn!(wglSwapBuffers, SwapBuffersFn, FALSE);
    if is_active() {
        if let Err(e) = lifecycle::present(process_state(), &*host(), SurfaceHandle::from_ptr(hdc)) {
            write_log_file(&format!("Error: present failed for surface {:?}: {:?}", hdc, e));
        }
    }
    real(hdc)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglSwapLayerBuffers(hdc: HDC, fuPlanes: UINT) -> BOOL {
    if fuPlanes != WGL_SWAP_MAIN_PLANE {
        reject(
            "wglSwapLayerBuffers",
            &format!("swapping planes {:#x} is not supported", fuPlanes),
            ERROR_INVALID_PARAMETER,
        );
        return FALSE;
    }
    wglSwapBuffers(hdc)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglSwapMultipleBuffers(cNumBuffers: UINT, pBuffers: *const WGLSWAP) -> DWORD {
    if pBuffers.is_null() {
        return 0;
    }
    for swap in std::slice::from_raw_parts(pBuffers, cNumBuffers as usize) {
        wglSwapBuffers(swap.hdc);
    }
    0
}

// layer planes
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglDescribeLayerPlane(
    _hdc: HDC,
    _iPixelFormat: INT,
    _iLayerPlane: INT,
    _nBytes: UINT,
    _plpd: *mut std::os::raw::c_void,
) -> BOOL {
    reject("wglDescribeLayerPlane", "layer planes are not supported", ERROR_NOT_SUPPORTED);
    FALSE
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetLayerPaletteEntries(
    _hdc: HDC,
    _iLayerPlane: INT,
    _iStart: INT,
    _cEntries: INT,
    _pcr: *mut COLORREF,
) -> INT {
    reject("wglGetLayerPaletteEntries", "layer planes are not supported", ERROR_NOT_SUPPORTED);
    0
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglSetLayerPaletteEntries(
    _hdc: HDC,
    _iLayerPlane: INT,
    _iStart: INT,
    _cEntries: INT,
    _pcr: *const COLORREF,
) -> INT {
    reject("wglSetLayerPaletteEntries", "layer planes are not supported", ERROR_NOT_SUPPORTED);
    0
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglRealizeLayerPalette(_hdc: HDC, _iLayerPlane: INT, _bRealize: BOOL) -> BOOL {
    reject("wglRealizeLayerPalette", "layer planes are not supported", ERROR_NOT_SUPPORTED);
    FALSE
}

// pixel formats
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglChoosePixelFormat(hdc: HDC, ppfd: *const PIXELFORMATDESCRIPTOR) -> INT {
    let real = real_fn!(wglChoosePixelFormat, ChoosePixelFormatFn, 0);
    if ppfd.is_null() || !is_active() {
        return real(hdc, ppfd);
    }
    write_log_file(&format!("wglChoosePixelFormat({:?}, {:?})", hdc, ppfd));
    let pfd = &*ppfd;
    if config().log_pixel_formats {
        log_lines(describe_descriptor(pfd));
    }
    match check_descriptor(pfd) {
        Err(e) => {
            reject("wglChoosePixelFormat", &format!("{:?}", e), ERROR_INVALID_PARAMETER);
            return 0;
        }
        Ok(warnings) => warnings
            .iter()
            .for_each(|w| write_log_file(&format!("Warning: {}", w))),
    }
    let format = real(hdc, ppfd);
    write_log_file(&format!("> returned format {}", format));
    format
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglChoosePixelFormatARB(
    hdc: HDC,
    piAttribIList: *const INT,
    pfAttribFList: *const FLOAT,
    nMaxFormats: UINT,
    piFormats: *mut INT,
    nNumFormats: *mut UINT,
) -> BOOL {
    let real = real_fn!(wglChoosePixelFormatARB, ChoosePixelFormatARBFn, FALSE);
    if !is_active() {
        return real(hdc, piAttribIList, pfAttribFList, nMaxFormats, piFormats, nNumFormats);
    }
    write_log_file(&format!("wglChoosePixelFormatARB({:?}, {:?})", hdc, piAttribIList));
    let pairs = attrib_pairs(piAttribIList);
    if config().log_pixel_formats {
        log_lines(describe_attribs(&pairs));
    }
    match check_attribs(&pairs) {
        Err(e) => {
            reject("wglChoosePixelFormatARB", &format!("{:?}", e), ERROR_INVALID_PARAMETER);
            return FALSE;
        }
        Ok(warnings) => warnings
            .iter()
            .for_each(|w| write_log_file(&format!("Warning: {}", w))),
    }
    if real(hdc, piAttribIList, pfAttribFList, nMaxFormats, piFormats, nNumFormats) == FALSE {
        log_driver_failure("wglChoosePixelFormatARB");
        return FALSE;
    }
    if !nNumFormats.is_null() && !piFormats.is_null() {
        let n = (*nNumFormats).min(nMaxFormats) as usize;
        let formats = std::slice::from_raw_parts(piFormats, n);
        write_log_file(&format!("> returned formats {:?}", formats));
    }
    TRUE
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetPixelFormatAttribivARB(
    hdc: HDC,
    iPixelFormat: INT,
    iLayerPlane: INT,
    nAttributes: UINT,
    piAttributes: *const INT,
    piValues: *mut INT,
) -> BOOL {
    if iLayerPlane != 0 {
        reject("wglGetPixelFormatAttribivARB", "layer planes are not supported", ERROR_INVALID_PARAMETER);
        return FALSE;
    }
    let real = real_fn!(wglGetPixelFormatAttribivARB, GetPixelFormatAttribivARBFn, FALSE);
    real(hdc, iPixelFormat, iLayerPlane, nAttributes, piAttributes, piValues)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetPixelFormatAttribfvARB(
    hdc: HDC,
    iPixelFormat: INT,
    iLayerPlane: INT,
    nAttributes: UINT,
    piAttributes: *const INT,
    pfValues: *mut FLOAT,
) -> BOOL {
    if iLayerPlane != 0 {
        reject("wglGetPixelFormatAttribfvARB", "layer planes are not supported", ERROR_INVALID_PARAMETER);
        return FALSE;
    }
    let real = real_fn!(wglGetPixelFormatAttribfvARB, GetPixelFormatAttribfvARBFn, FALSE);
    real(hdc, iPixelFormat, iLayerPlane, nAttributes, piAttributes, pfValues)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetPixelFormat(hdc: HDC) -> INT {
    let real = real_fn!(wglGetPixelFormat, GetPixelFormatFn, 0);
    real(hdc)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglDescribePixelFormat(
    hdc: HDC,
    iPixelFormat: INT,
    nBytes: UINT,
    ppfd: *mut PIXELFORMATDESCRIPTOR,
) -> INT {
    let real = real_fn!(wglDescribePixelFormat, DescribePixelFormatFn, 0);
    real(hdc, iPixelFormat, nBytes, ppfd)
}

/// Some hosts call wglSetPixelFormat directly instead of going through GDI, which leaves the
/// window without a format.  Hand those to GDI as well.
#[cfg(windows)]
unsafe fn gdi_set_pixel_format(hdc: HDC, format: INT, ppfd: *const PIXELFORMATDESCRIPTOR) {
    use winapi::um::wingdi::{GetPixelFormat, SetPixelFormat};

    if GetPixelFormat(hdc as _) == 0 {
        write_log_file("Warning: wglSetPixelFormat called directly, passing on to SetPixelFormat");
        SetPixelFormat(hdc as _, format, ppfd as *const _);
    }
}

#[cfg(not(windows))]
unsafe fn gdi_set_pixel_format(_hdc: HDC, _format: INT, _ppfd: *const PIXELFORMATDESCRIPTOR) {}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglSetPixelFormat(
    hdc: HDC,
    iPixelFormat: INT,
    ppfd: *const PIXELFORMATDESCRIPTOR,
) -> BOOL {
    let real = real_fn!(wglSetPixelFormat, SetPixelFormatFn, FALSE);
    write_log_file(&format!("wglSetPixelFormat({:?}, {})", hdc, iPixelFormat));
    if real(hdc, iPixelFormat, ppfd) == FALSE {
        log_driver_failure("wglSetPixelFormat");
        return FALSE;
    }
    gdi_set_pixel_format(hdc, iPixelFormat, ppfd);
    TRUE
}

// pbuffers
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglCreatePbufferARB(
    hdc: HDC,
    iPixelFormat: INT,
    iWidth: INT,
    iHeight: INT,
    piAttribList: *const INT,
) -> HPBUFFERARB {
    let real = real_fn!(wglCreatePbufferARB, CreatePbufferARBFn, null_mut());
    write_log_file(&format!(
        "wglCreatePbufferARB({:?}, {}, {}x{})",
        hdc, iPixelFormat, iWidth, iHeight
    ));
    let pbuffer = real(hdc, iPixelFormat, iWidth, iHeight, piAttribList);
    if pbuffer.is_null() {
        log_driver_failure("wglCreatePbufferARB");
    }
    pbuffer
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglDestroyPbufferARB(hPbuffer: HPBUFFERARB) -> BOOL {
    let real = real_fn!(wglDestroyPbufferARB, DestroyPbufferARBFn, FALSE);
    write_log_file(&format!("wglDestroyPbufferARB({:?})", hPbuffer));
    real(hPbuffer)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetPbufferDCARB(hPbuffer: HPBUFFERARB) -> HDC {
    let real = real_fn!(wglGetPbufferDCARB, GetPbufferDCARBFn, null_mut());
    let hdc = real(hPbuffer);
    if !hdc.is_null() && is_active() {
        if let Err(e) = process_state().add_offscreen_surface(SurfaceHandle::from_ptr(hdc)) {
            write_log_file(&format!("Error: failed to record pbuffer surface {:?}: {:?}", hdc, e));
        }
    }
    hdc
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglReleasePbufferDCARB(hPbuffer: HPBUFFERARB, hdc: HDC) -> INT {
    let real = real_fn!(wglReleasePbufferDCARB, ReleasePbufferDCARBFn, 0);
    if is_active() {
        if let Err(e) = process_state().remove_offscreen_surface(SurfaceHandle::from_ptr(hdc)) {
            write_log_file(&format!("Error: failed to forget pbuffer surface {:?}: {:?}", hdc, e));
        }
    }
    real(hPbuffer, hdc)
}
