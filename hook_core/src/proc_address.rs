/*
Extension entries never go through the export table, so wglGetProcAddress is where they get
intercepted: the driver's answer is registered against our interceptor and the interceptor is
handed back instead.
 */
use fnv::FnvHashMap;
use std::ffi::CStr;
use std::ptr::null;

use hook_registry::hooks;
use shared_gl::defs_gl::*;
use shared_gl::util::write_log_file;

use crate::hook_gl::*;
use crate::hook_wgl::*;

macro_rules! intercepts {
    ($($name:ident),* $(,)?) => {{
        let mut m: FnvHashMap<&'static str, usize> = FnvHashMap::default();
        $(m.insert(stringify!($name), $name as usize);)*
        m
    }};
}

lazy_static! {
    static ref INTERCEPTS: FnvHashMap<&'static str, usize> = intercepts![
        // draws
        glDrawArrays,
        glDrawArraysInstanced,
        glDrawArraysInstancedARB,
        glDrawArraysInstancedEXT,
        glDrawArraysInstancedBaseInstance,
        glDrawArraysIndirect,
        glDrawElements,
        glDrawElementsBaseVertex,
        glDrawElementsInstanced,
        glDrawElementsInstancedARB,
        glDrawElementsInstancedEXT,
        glDrawElementsInstancedBaseVertex,
        glDrawElementsInstancedBaseInstance,
        glDrawElementsInstancedBaseVertexBaseInstance,
        glDrawElementsIndirect,
        glDrawRangeElements,
        glDrawRangeElementsBaseVertex,
        glMultiDrawArrays,
        glMultiDrawElements,
        glMultiDrawElementsBaseVertex,
        glMultiDrawArraysIndirect,
        glMultiDrawElementsIndirect,
        // framebuffers
        glBindFramebuffer,
        glBindFramebufferEXT,
        glFramebufferTexture,
        glFramebufferTextureLayer,
        glFramebufferTexture1D,
        glFramebufferTexture1DEXT,
        glFramebufferTexture2D,
        glFramebufferTexture2DEXT,
        glFramebufferTexture3D,
        glFramebufferTexture3DEXT,
        glFramebufferRenderbuffer,
        glFramebufferRenderbufferEXT,
        glBindRenderbuffer,
        glDeleteFramebuffers,
        glDeleteFramebuffersEXT,
        glDeleteRenderbuffers,
        glDeleteRenderbuffersEXT,
        glTexImage3D,
        // wgl extensions
        wglCreateContextAttribsARB,
        wglChoosePixelFormatARB,
        wglGetPixelFormatAttribivARB,
        wglGetPixelFormatAttribfvARB,
        wglCreatePbufferARB,
        wglDestroyPbufferARB,
        wglGetPbufferDCARB,
        wglReleasePbufferDCARB,
    ];
}

/// Interceptor for an extension entry, if there is one.
pub fn interceptor_for(name: &str) -> Option<usize> {
    INTERCEPTS.get(name).copied()
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn wglGetProcAddress(lpszProc: LPCSTR) -> PROC {
    let real = real_fn!(wglGetProcAddress, GetProcAddressFn, null());
    let addr = real(lpszProc);
    if lpszProc.is_null() || addr.is_null() {
        return addr;
    }
    let name = match CStr::from_ptr(lpszProc).to_str() {
        Ok(n) => n,
        Err(_) => return addr,
    };
    let interceptor = match interceptor_for(name) {
        Some(i) => i,
        None => return addr,
    };
    match hooks().install(addr as usize, interceptor) {
        Ok(_) => interceptor as PROC,
        Err(e) => {
            write_log_file(&format!(
                "Warning: can't intercept {} at {:?}, returning driver entry: {:?}",
                name, addr, e
            ));
            addr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, fake_address};
    use std::ffi::CString;

    fn lookup(name: &str) -> usize {
        let c = CString::new(name).unwrap();
        unsafe { wglGetProcAddress(c.as_ptr()) as usize }
    }

    #[test]
    fn test_extension_entries_are_intercepted() {
        let _t = test_support::setup();
        assert_eq!(lookup("wglCreateContextAttribsARB"), wglCreateContextAttribsARB as usize);
        assert_eq!(lookup("glDrawArraysInstanced"), glDrawArraysInstanced as usize);
        // asking again gives the same answer
        assert_eq!(lookup("glDrawArraysInstanced"), glDrawArraysInstanced as usize);
        assert_eq!(
            hooks().trampoline_for(glDrawArraysInstanced as usize).map(|t| t.address()),
            fake_address("glDrawArraysInstanced")
        );
    }

    #[test]
    fn test_other_entries_pass_through() {
        let _t = test_support::setup();
        // known to the driver but not to us
        assert_eq!(Some(lookup("glGenQueries")), fake_address("glGenQueries"));
        assert_eq!(lookup("glNotARealEntry"), 0);
        assert!(unsafe { wglGetProcAddress(std::ptr::null()) }.is_null());
    }
}
