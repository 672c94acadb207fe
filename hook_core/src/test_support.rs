/*
A fake driver and host for the entry point tests.  The driver records the calls it receives and
keeps just enough texture and binding state to answer the size queries; the host treats any
surface at or above 0x1000 as window-backed.
 */
use fnv::FnvHashMap;
use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr::null;
use std::sync::{Arc, Mutex, MutexGuard};

use global_state::host::HostPlatform;
use global_state::process_state;
use runtime::effects::{EffectSubsystem, NoEffects};
use shared_gl::defs_gl::*;
use shared_gl::types::{FrameRect, GlVersion, SurfaceHandle, WindowHandle};
use util::conf::HookConfig;

use crate::dispatch::{set_driver, DriverModule};
use crate::host::{set_host, set_last_error};
use crate::init::install_config;
use crate::pixel_format::attrib_pairs;

pub const S1: HDC = 0x1000 as HDC;
pub const S2: HDC = 0x2000 as HDC;
/// Below 0x1000, so it has no window.
pub const MEM_DC: HDC = 0x10 as HDC;
pub const CTX_A: HGLRC = 0xA as HGLRC;
/// The fake driver refuses to make this current.
pub const BAD_CTX: HGLRC = 0xBAD as HGLRC;
pub const PBUFFER: HPBUFFERARB = 0x5000 as HPBUFFERARB;

struct FakeGl {
    calls: Vec<String>,
    textures: FnvHashMap<GLuint, (GLint, GLint)>,
    renderbuffers: FnvHashMap<GLuint, (GLint, GLint)>,
    /// Target each texture was first bound to; binding it anywhere else fails.
    texture_targets: FnvHashMap<GLuint, GLenum>,
    bound_textures: FnvHashMap<GLenum, GLuint>,
    bound_renderbuffer: GLuint,
    error: GLenum,
    next_context: usize,
    client_rect: FrameRect,
    context_version: GlVersion,
}

impl Default for FakeGl {
    fn default() -> Self {
        FakeGl {
            calls: vec![],
            textures: FnvHashMap::default(),
            renderbuffers: FnvHashMap::default(),
            texture_targets: FnvHashMap::default(),
            bound_textures: FnvHashMap::default(),
            bound_renderbuffer: 0,
            error: GL_NO_ERROR,
            next_context: 0xC000,
            client_rect: FrameRect::new(1920, 1080),
            context_version: GlVersion::new(4, 6),
        }
    }
}

lazy_static! {
    static ref TEST_LOCK: Mutex<()> = Mutex::new(());
    static ref FAKE: Mutex<FakeGl> = Mutex::new(FakeGl::default());
}

thread_local! {
    static CURRENT: Cell<(usize, usize)> = Cell::new((0, 0));
}

fn fake() -> MutexGuard<'static, FakeGl> {
    FAKE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record(call: String) {
    fake().calls.push(call);
}

/// Holds the global test lock; everything that touches process state runs under it.
pub struct TestGuard {
    _lock: MutexGuard<'static, ()>,
}

pub fn setup() -> TestGuard {
    setup_with(|_| {})
}

pub fn setup_with<F>(configure: F) -> TestGuard
where
    F: FnOnce(&mut HookConfig),
{
    let lock = TEST_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    set_driver(Arc::new(FakeDriver));
    set_host(Arc::new(FakeHost));

    let mut conf = HookConfig::new();
    configure(&mut conf);
    install_config(conf);

    if let Ok(mut tables) = process_state().lock() {
        *tables = Default::default();
    }
    *fake() = FakeGl::default();
    CURRENT.with(|c| c.set((0, 0)));
    set_last_error(0);
    TestGuard { _lock: lock }
}

pub fn calls() -> Vec<String> {
    fake().calls.clone()
}

pub fn take_calls() -> Vec<String> {
    std::mem::take(&mut fake().calls)
}

pub fn set_texture(name: GLuint, width: GLint, height: GLint) {
    fake().textures.insert(name, (width, height));
}

pub fn texture(name: GLuint) -> Option<(GLint, GLint)> {
    fake().textures.get(&name).copied()
}

pub fn set_texture_target(name: GLuint, target: GLenum) {
    fake().texture_targets.insert(name, target);
}

/// The error the host's next glGetError would see, left in place.
pub fn pending_error() -> GLenum {
    fake().error
}

pub fn set_renderbuffer(name: GLuint, width: GLint, height: GLint) {
    fake().renderbuffers.insert(name, (width, height));
}

pub fn set_bound_texture(target: GLenum, name: GLuint) {
    fake().bound_textures.insert(target, name);
}

pub fn bound_texture(target: GLenum) -> GLuint {
    fake().bound_textures.get(&target).copied().unwrap_or(0)
}

pub fn set_bound_renderbuffer(name: GLuint) {
    fake().bound_renderbuffer = name;
}

pub fn bound_renderbuffer() -> GLuint {
    fake().bound_renderbuffer
}

pub fn set_client_rect(rect: FrameRect) {
    fake().client_rect = rect;
}

pub fn set_context_version(version: GlVersion) {
    fake().context_version = version;
}

struct FakeDriver;

impl DriverModule for FakeDriver {
    fn resolve(&self, name: &str) -> Option<usize> {
        fake_address(name)
    }
}

struct FakeHost;

impl HostPlatform for FakeHost {
    fn window_for_surface(&self, surface: SurfaceHandle) -> Option<WindowHandle> {
        if surface.0 >= 0x1000 {
            Some(WindowHandle(surface.0 + 1))
        } else {
            None
        }
    }
    fn client_rect(&self, _window: WindowHandle) -> FrameRect {
        fake().client_rect
    }
    fn context_version(&self) -> Option<GlVersion> {
        Some(fake().context_version)
    }
    fn create_effects(&self, _surface: SurfaceHandle) -> Box<dyn EffectSubsystem> {
        Box::new(NoEffects)
    }
}

/// Address of the fake driver entry named `name`.
pub fn fake_address(name: &str) -> Option<usize> {
    let addr = match name {
        "glDrawArrays" => fake_glDrawArrays as usize,
        "glDrawArraysInstanced" => fake_glDrawArraysInstanced as usize,
        "glDrawElementsInstanced" => fake_glDrawElementsInstanced as usize,
        "glMultiDrawArrays" => fake_glMultiDrawArrays as usize,
        "glDrawArraysIndirect" => fake_glDrawArraysIndirect as usize,
        "glBegin" => fake_glBegin as usize,
        "glEnd" => fake_glEnd as usize,
        "glVertex3f" => fake_glVertex3f as usize,
        "glVertex4i" => fake_glVertex4i as usize,
        "glVertex3sv" => fake_glVertex3sv as usize,
        "glBindFramebuffer" => fake_glBindFramebuffer as usize,
        "glFramebufferTexture" => fake_glFramebufferTexture as usize,
        "glFramebufferTexture2D" => fake_glFramebufferTexture2D as usize,
        "glFramebufferRenderbuffer" => fake_glFramebufferRenderbuffer as usize,
        "glTexImage1D" => fake_glTexImage1D as usize,
        "glTexImage2D" => fake_glTexImage2D as usize,
        "glBindTexture" => fake_glBindTexture as usize,
        "glBindRenderbuffer" => fake_glBindRenderbuffer as usize,
        "glGetIntegerv" => fake_glGetIntegerv as usize,
        "glGetTexLevelParameteriv" => fake_glGetTexLevelParameteriv as usize,
        "glGetRenderbufferParameteriv" => fake_glGetRenderbufferParameteriv as usize,
        "glGenQueries" => fake_glGenQueries as usize,
        "glGetError" => fake_glGetError as usize,
        "glDeleteTextures" => fake_glDeleteTextures as usize,
        "glDeleteRenderbuffers" => fake_glDeleteRenderbuffers as usize,
        "glDeleteFramebuffers" => fake_glDeleteFramebuffers as usize,
        "wglMakeCurrent" => fake_wglMakeCurrent as usize,
        "wglGetCurrentDC" => fake_wglGetCurrentDC as usize,
        "wglGetCurrentContext" => fake_wglGetCurrentContext as usize,
        "wglSwapBuffers" => fake_wglSwapBuffers as usize,
        "wglCreateContext" => fake_wglCreateContext as usize,
        "wglCreateContextAttribsARB" => fake_wglCreateContextAttribsARB as usize,
        "wglDeleteContext" => fake_wglDeleteContext as usize,
        "wglShareLists" => fake_wglShareLists as usize,
        "wglChoosePixelFormat" => fake_wglChoosePixelFormat as usize,
        "wglChoosePixelFormatARB" => fake_wglChoosePixelFormatARB as usize,
        "wglGetPbufferDCARB" => fake_wglGetPbufferDCARB as usize,
        "wglReleasePbufferDCARB" => fake_wglReleasePbufferDCARB as usize,
        "wglGetProcAddress" => fake_wglGetProcAddress as usize,
        _ => return None,
    };
    Some(addr)
}

// gl
unsafe extern "system" fn fake_glDrawArrays(_mode: GLenum, _first: GLint, count: GLsizei) {
    record(format!("glDrawArrays {}", count));
}

unsafe extern "system" fn fake_glDrawArraysInstanced(_mode: GLenum, _first: GLint, count: GLsizei, primcount: GLsizei) {
    record(format!("glDrawArraysInstanced {} {}", count, primcount));
}

unsafe extern "system" fn fake_glDrawElementsInstanced(
    _mode: GLenum,
    count: GLsizei,
    _type_: GLenum,
    _indices: *const c_void,
    primcount: GLsizei,
) {
    record(format!("glDrawElementsInstanced {} {}", count, primcount));
}

unsafe extern "system" fn fake_glMultiDrawArrays(
    _mode: GLenum,
    _first: *const GLint,
    _count: *const GLsizei,
    drawcount: GLsizei,
) {
    record(format!("glMultiDrawArrays {}", drawcount));
}

unsafe extern "system" fn fake_glDrawArraysIndirect(_mode: GLenum, _indirect: *const c_void) {
    record("glDrawArraysIndirect".to_owned());
}

unsafe extern "system" fn fake_glBegin(_mode: GLenum) {
    record("glBegin".to_owned());
}

unsafe extern "system" fn fake_glEnd() {
    record("glEnd".to_owned());
}

unsafe extern "system" fn fake_glVertex3f(_x: GLfloat, _y: GLfloat, _z: GLfloat) {
    record("glVertex3f".to_owned());
}

unsafe extern "system" fn fake_glVertex4i(_x: GLint, _y: GLint, _z: GLint, _w: GLint) {
    record("glVertex4i".to_owned());
}

unsafe extern "system" fn fake_glVertex3sv(v: *const GLshort) {
    record(format!("glVertex3sv {}", *v));
}

unsafe extern "system" fn fake_glBindFramebuffer(target: GLenum, framebuffer: GLuint) {
    record(format!("glBindFramebuffer {:#x} {}", target, framebuffer));
}

unsafe extern "system" fn fake_glFramebufferTexture(_target: GLenum, attachment: GLenum, texture: GLuint, _level: GLint) {
    record(format!("glFramebufferTexture {:#x} {}", attachment, texture));
}

unsafe extern "system" fn fake_glFramebufferTexture2D(
    _target: GLenum,
    attachment: GLenum,
    _textarget: GLenum,
    texture: GLuint,
    _level: GLint,
) {
    record(format!("glFramebufferTexture2D {:#x} {}", attachment, texture));
}

unsafe extern "system" fn fake_glFramebufferRenderbuffer(
    _target: GLenum,
    attachment: GLenum,
    _renderbuffertarget: GLenum,
    renderbuffer: GLuint,
) {
    record(format!("glFramebufferRenderbuffer {:#x} {}", attachment, renderbuffer));
}

unsafe extern "system" fn fake_glTexImage1D(
    _target: GLenum,
    _level: GLint,
    internalformat: GLint,
    _width: GLsizei,
    _border: GLint,
    _format: GLenum,
    _type_: GLenum,
    _pixels: *const c_void,
) {
    record(format!("glTexImage1D {:#x}", internalformat));
}

unsafe extern "system" fn fake_glTexImage2D(
    target: GLenum,
    _level: GLint,
    internalformat: GLint,
    width: GLsizei,
    height: GLsizei,
    _border: GLint,
    _format: GLenum,
    _type_: GLenum,
    _pixels: *const c_void,
) {
    let mut f = fake();
    f.calls.push(format!("glTexImage2D {:#x} {}x{}", internalformat, width, height));
    if let Some(name) = f.bound_textures.get(&target).copied() {
        f.textures.insert(name, (width, height));
    }
}

unsafe extern "system" fn fake_glBindTexture(target: GLenum, texture: GLuint) {
    let mut f = fake();
    f.calls.push(format!("glBindTexture {}", texture));
    if texture != 0 {
        match f.texture_targets.get(&texture).copied() {
            Some(t) if t != target => {
                if f.error == GL_NO_ERROR {
                    f.error = GL_INVALID_OPERATION;
                }
                return;
            }
            Some(_) => {}
            None => {
                f.texture_targets.insert(texture, target);
            }
        }
    }
    f.bound_textures.insert(target, texture);
}

unsafe extern "system" fn fake_glBindRenderbuffer(_target: GLenum, renderbuffer: GLuint) {
    fake().bound_renderbuffer = renderbuffer;
}

fn binding_target(pname: GLenum) -> Option<GLenum> {
    let target = match pname {
        GL_TEXTURE_BINDING_1D => GL_TEXTURE_1D,
        GL_TEXTURE_BINDING_2D => GL_TEXTURE_2D,
        GL_TEXTURE_BINDING_3D => GL_TEXTURE_3D,
        GL_TEXTURE_BINDING_RECTANGLE => GL_TEXTURE_RECTANGLE,
        GL_TEXTURE_BINDING_2D_ARRAY => GL_TEXTURE_2D_ARRAY,
        GL_TEXTURE_BINDING_2D_MULTISAMPLE => GL_TEXTURE_2D_MULTISAMPLE,
        GL_TEXTURE_BINDING_CUBE_MAP => GL_TEXTURE_CUBE_MAP,
        _ => return None,
    };
    Some(target)
}

unsafe extern "system" fn fake_glGetIntegerv(pname: GLenum, data: *mut GLint) {
    let f = fake();
    let value = match pname {
        GL_RENDERBUFFER_BINDING => f.bound_renderbuffer,
        GL_MAJOR_VERSION => f.context_version.major as GLuint,
        _ => match binding_target(pname) {
            Some(target) => f.bound_textures.get(&target).copied().unwrap_or(0),
            None => return,
        },
    };
    *data = value as GLint;
}

unsafe extern "system" fn fake_glGetTexLevelParameteriv(target: GLenum, _level: GLint, pname: GLenum, params: *mut GLint) {
    let f = fake();
    let bound_as = match target {
        GL_TEXTURE_CUBE_MAP_POSITIVE_X..=GL_TEXTURE_CUBE_MAP_NEGATIVE_Z => GL_TEXTURE_CUBE_MAP,
        t => t,
    };
    let size = f
        .bound_textures
        .get(&bound_as)
        .and_then(|name| f.textures.get(name))
        .copied();
    if let Some((w, h)) = size {
        match pname {
            GL_TEXTURE_WIDTH => *params = w,
            GL_TEXTURE_HEIGHT => *params = h,
            _ => {}
        }
    }
}

unsafe extern "system" fn fake_glGetRenderbufferParameteriv(_target: GLenum, pname: GLenum, params: *mut GLint) {
    let f = fake();
    if let Some((w, h)) = f.renderbuffers.get(&f.bound_renderbuffer).copied() {
        match pname {
            GL_RENDERBUFFER_WIDTH => *params = w,
            GL_RENDERBUFFER_HEIGHT => *params = h,
            _ => {}
        }
    }
}

unsafe extern "system" fn fake_glGenQueries(_n: GLsizei, _ids: *mut GLuint) {}

unsafe extern "system" fn fake_glGetError() -> GLenum {
    std::mem::replace(&mut fake().error, GL_NO_ERROR)
}

unsafe fn names<'a>(n: GLsizei, names: *const GLuint) -> &'a [GLuint] {
    if n <= 0 || names.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(names, n as usize)
    }
}

unsafe extern "system" fn fake_glDeleteTextures(n: GLsizei, textures: *const GLuint) {
    let mut f = fake();
    for name in names(n, textures) {
        f.textures.remove(name);
        f.texture_targets.remove(name);
    }
    f.calls.push(format!("glDeleteTextures {:?}", names(n, textures)));
}

unsafe extern "system" fn fake_glDeleteRenderbuffers(n: GLsizei, renderbuffers: *const GLuint) {
    let mut f = fake();
    for name in names(n, renderbuffers) {
        f.renderbuffers.remove(name);
    }
    f.calls.push(format!("glDeleteRenderbuffers {:?}", names(n, renderbuffers)));
}

unsafe extern "system" fn fake_glDeleteFramebuffers(n: GLsizei, framebuffers: *const GLuint) {
    record(format!("glDeleteFramebuffers {:?}", names(n, framebuffers)));
}

// wgl
unsafe extern "system" fn fake_wglMakeCurrent(hdc: HDC, hglrc: HGLRC) -> BOOL {
    record(format!("wglMakeCurrent {:x} {:x}", hdc as usize, hglrc as usize));
    if hglrc == BAD_CTX {
        set_last_error(ERROR_INVALID_HANDLE);
        return FALSE;
    }
    let pair = if hglrc.is_null() { (0, 0) } else { (hdc as usize, hglrc as usize) };
    CURRENT.with(|c| c.set(pair));
    TRUE
}

unsafe extern "system" fn fake_wglGetCurrentDC() -> HDC {
    CURRENT.with(|c| c.get().0) as HDC
}

unsafe extern "system" fn fake_wglGetCurrentContext() -> HGLRC {
    CURRENT.with(|c| c.get().1) as HGLRC
}

unsafe extern "system" fn fake_wglSwapBuffers(hdc: HDC) -> BOOL {
    record(format!("wglSwapBuffers {:x}", hdc as usize));
    TRUE
}

fn new_context() -> HGLRC {
    let mut f = fake();
    f.next_context += 1;
    f.next_context as HGLRC
}

unsafe extern "system" fn fake_wglCreateContext(hdc: HDC) -> HGLRC {
    record(format!("wglCreateContext {:x}", hdc as usize));
    if hdc.is_null() {
        set_last_error(ERROR_INVALID_HANDLE);
        return std::ptr::null_mut();
    }
    new_context()
}

unsafe extern "system" fn fake_wglCreateContextAttribsARB(_hdc: HDC, _share: HGLRC, attribs: *const INT) -> HGLRC {
    record(format!("wglCreateContextAttribsARB {:?}", attrib_pairs(attribs)));
    new_context()
}

unsafe extern "system" fn fake_wglDeleteContext(hglrc: HGLRC) -> BOOL {
    record(format!("wglDeleteContext {:x}", hglrc as usize));
    TRUE
}

unsafe extern "system" fn fake_wglShareLists(hglrc1: HGLRC, hglrc2: HGLRC) -> BOOL {
    record(format!("wglShareLists {:x} {:x}", hglrc1 as usize, hglrc2 as usize));
    TRUE
}

unsafe extern "system" fn fake_wglChoosePixelFormat(hdc: HDC, _ppfd: *const PIXELFORMATDESCRIPTOR) -> INT {
    record(format!("wglChoosePixelFormat {:x}", hdc as usize));
    7
}

unsafe extern "system" fn fake_wglChoosePixelFormatARB(
    hdc: HDC,
    _piAttribIList: *const INT,
    _pfAttribFList: *const FLOAT,
    nMaxFormats: UINT,
    piFormats: *mut INT,
    nNumFormats: *mut UINT,
) -> BOOL {
    record(format!("wglChoosePixelFormatARB {:x}", hdc as usize));
    if nMaxFormats > 0 && !piFormats.is_null() {
        *piFormats = 7;
    }
    if !nNumFormats.is_null() {
        *nNumFormats = 1;
    }
    TRUE
}

unsafe extern "system" fn fake_wglGetPbufferDCARB(hPbuffer: HPBUFFERARB) -> HDC {
    (hPbuffer as usize + 0x100) as HDC
}

unsafe extern "system" fn fake_wglReleasePbufferDCARB(_hPbuffer: HPBUFFERARB, _hdc: HDC) -> INT {
    1
}

unsafe extern "system" fn fake_wglGetProcAddress(name: LPCSTR) -> PROC {
    if name.is_null() {
        return null();
    }
    match CStr::from_ptr(name).to_str().ok().and_then(fake_address) {
        Some(addr) => addr as PROC,
        None => null(),
    }
}
