/*
GL entries with behavior: draw and immediate-mode calls feed the depth heuristic, framebuffer
binds and depth attachments keep its candidate table current, and texture allocations get sized
formats.  Everything else is a plain `forward!`.
 */
use std::os::raw::c_void;

use global_state::process_state;
use runtime::Runtime;
use shared_gl::defs_gl::*;
use shared_gl::types::{SurfaceHandle, ViewHandle};
use shared_gl::util::write_log_file;

use crate::draw_counts::{instanced, multi_draw_total, vertices};
use crate::gl_query;
use crate::init::is_active;
use crate::promote::promote_internal_format;

/// Run `f` on the runtime of the surface current on this thread.  False if there is none.
pub(crate) fn with_current_runtime<F>(f: F) -> bool
where
    F: FnOnce(&mut Runtime),
{
    if !is_active() {
        return false;
    }
    let surface = SurfaceHandle::from_ptr(unsafe { crate::hook_wgl::wglGetCurrentDC() });
    if surface.is_null() {
        return false;
    }
    process_state().with_runtime(surface, f)
}

fn current_has_runtime() -> bool {
    if !is_active() {
        return false;
    }
    let surface = SurfaceHandle::from_ptr(unsafe { crate::hook_wgl::wglGetCurrentDC() });
    !surface.is_null() && process_state().runtime_for(surface).is_some()
}

fn record_draw(vertices: u64) {
    with_current_runtime(|rt| rt.on_draw_call(vertices));
}

fn is_draw_target(target: GLenum) -> bool {
    target == GL_FRAMEBUFFER || target == GL_DRAW_FRAMEBUFFER
}

fn is_depth_attachment(attachment: GLenum) -> bool {
    attachment == GL_DEPTH_ATTACHMENT || attachment == GL_DEPTH_STENCIL_ATTACHMENT
}

/// Track a depth attachment change.  `object` 0 detaches; otherwise `size` is asked for the
/// attached object's dimensions, before the runtime is locked.
fn track_depth_attachment<F>(target: GLenum, attachment: GLenum, view: ViewHandle, size: F)
where
    F: FnOnce() -> Option<(u32, u32)>,
{
    if !is_draw_target(target) || !is_depth_attachment(attachment) || !current_has_runtime() {
        return;
    }
    if view.name == 0 {
        with_current_runtime(|rt| rt.on_depth_attachment(None, 0, 0));
        return;
    }
    // an unknown size never matches the back buffer, but the candidate still collects counts
    let (w, h) = size().unwrap_or_else(|| {
        write_log_file(&format!("Warning: can't query size of depth attachment {:?}", view));
        (0, 0)
    });
    with_current_runtime(|rt| rt.on_depth_attachment(Some(view), w, h));
}

/// Target the texture was first bound to while a runtime was current.
fn recorded_texture_target(texture: GLuint) -> Option<GLenum> {
    let mut target = None;
    with_current_runtime(|rt| target = rt.texture_target(texture));
    target
}

/// Size of an attached texture level.  A `textarget` that disagrees with the texture's own
/// target means the driver already refused the attachment, so nothing is bound to find out.
unsafe fn attached_texture_size(textarget: Option<GLenum>, texture: GLuint, level: GLint) -> Option<(u32, u32)> {
    let recorded = recorded_texture_target(texture);
    match textarget {
        Some(t) => {
            let bound_as = gl_query::bind_target(t).map(|(target, _)| target);
            if recorded.is_some() && recorded != bound_as {
                return None;
            }
            gl_query::texture_size(Some(t), texture, level)
        }
        None => gl_query::texture_size(recorded, texture, level),
    }
}

unsafe fn object_names<'a>(n: GLsizei, names: *const GLuint) -> &'a [GLuint] {
    if n <= 0 || names.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(names, n as usize)
    }
}

macro_rules! draw_hook {
    ($name:ident, $fnty:ty, ($($arg:ident: $argty:ty),*), $count:expr) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name($($arg: $argty),*) {
            let real = real_fn!($name, $fnty);
            record_draw($count);
            real($($arg),*)
        }
    };
}

macro_rules! vertex_hook {
    ($name:ident, $fnty:ty, ($($arg:ident: $argty:ty),*)) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name($($arg: $argty),*) {
            let real = real_fn!($name, $fnty);
            with_current_runtime(|rt| rt.on_vertex());
            real($($arg),*)
        }
    };
}

/// Pure pass-through entry.
macro_rules! forward {
    ($name:ident($($arg:ident: $argty:ty),*)) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name($($arg: $argty),*) {
            let real = real_fn!($name, unsafe extern "system" fn($($argty),*));
            real($($arg),*)
        }
    };
    ($name:ident($($arg:ident: $argty:ty),*) -> $ret:ty, $fail:expr) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name($($arg: $argty),*) -> $ret {
            let real = real_fn!($name, unsafe extern "system" fn($($argty),*) -> $ret, $fail);
            real($($arg),*)
        }
    };
}

// non-indexed
draw_hook!(glDrawArrays, DrawArraysFn, (mode: GLenum, first: GLint, count: GLsizei), vertices(count));
draw_hook!(glDrawArraysInstanced, DrawArraysInstancedFn,
    (mode: GLenum, first: GLint, count: GLsizei, primcount: GLsizei), instanced(count, primcount));
draw_hook!(glDrawArraysInstancedARB, DrawArraysInstancedFn,
    (mode: GLenum, first: GLint, count: GLsizei, primcount: GLsizei), instanced(count, primcount));
draw_hook!(glDrawArraysInstancedEXT, DrawArraysInstancedFn,
    (mode: GLenum, first: GLint, count: GLsizei, primcount: GLsizei), instanced(count, primcount));
draw_hook!(glDrawArraysInstancedBaseInstance, DrawArraysInstancedBaseInstanceFn,
    (mode: GLenum, first: GLint, count: GLsizei, primcount: GLsizei, baseinstance: GLuint),
    instanced(count, primcount));
draw_hook!(glDrawArraysIndirect, DrawArraysIndirectFn, (mode: GLenum, indirect: *const c_void), 0);

// indexed
draw_hook!(glDrawElements, DrawElementsFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void), vertices(count));
draw_hook!(glDrawElementsBaseVertex, DrawElementsBaseVertexFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, basevertex: GLint),
    vertices(count));
draw_hook!(glDrawElementsInstanced, DrawElementsInstancedFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei),
    instanced(count, primcount));
draw_hook!(glDrawElementsInstancedARB, DrawElementsInstancedFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei),
    instanced(count, primcount));
draw_hook!(glDrawElementsInstancedEXT, DrawElementsInstancedFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei),
    instanced(count, primcount));
draw_hook!(glDrawElementsInstancedBaseVertex, DrawElementsInstancedBaseVertexFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei,
     basevertex: GLint),
    instanced(count, primcount));
draw_hook!(glDrawElementsInstancedBaseInstance, DrawElementsInstancedBaseInstanceFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei,
     baseinstance: GLuint),
    instanced(count, primcount));
draw_hook!(glDrawElementsInstancedBaseVertexBaseInstance, DrawElementsInstancedBaseVertexBaseInstanceFn,
    (mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, primcount: GLsizei,
     basevertex: GLint, baseinstance: GLuint),
    instanced(count, primcount));
draw_hook!(glDrawElementsIndirect, DrawElementsIndirectFn,
    (mode: GLenum, type_: GLenum, indirect: *const c_void), 0);
draw_hook!(glDrawRangeElements, DrawRangeElementsFn,
    (mode: GLenum, start: GLuint, end: GLuint, count: GLsizei, type_: GLenum, indices: *const c_void),
    vertices(count));
draw_hook!(glDrawRangeElementsBaseVertex, DrawRangeElementsBaseVertexFn,
    (mode: GLenum, start: GLuint, end: GLuint, count: GLsizei, type_: GLenum, indices: *const c_void,
     basevertex: GLint),
    vertices(count));

// multi-draw
draw_hook!(glMultiDrawArrays, MultiDrawArraysFn,
    (mode: GLenum, first: *const GLint, count: *const GLsizei, drawcount: GLsizei),
    multi_draw_total(count, drawcount));
draw_hook!(glMultiDrawElements, MultiDrawElementsFn,
    (mode: GLenum, count: *const GLsizei, type_: GLenum, indices: *const *const c_void, drawcount: GLsizei),
    multi_draw_total(count, drawcount));
draw_hook!(glMultiDrawElementsBaseVertex, MultiDrawElementsBaseVertexFn,
    (mode: GLenum, count: *const GLsizei, type_: GLenum, indices: *const *const c_void, drawcount: GLsizei,
     basevertex: *const GLint),
    multi_draw_total(count, drawcount));
draw_hook!(glMultiDrawArraysIndirect, MultiDrawArraysIndirectFn,
    (mode: GLenum, indirect: *const c_void, drawcount: GLsizei, stride: GLsizei), 0);
draw_hook!(glMultiDrawElementsIndirect, MultiDrawElementsIndirectFn,
    (mode: GLenum, type_: GLenum, indirect: *const c_void, drawcount: GLsizei, stride: GLsizei), 0);

// immediate mode
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glBegin(mode: GLenum) {
    let real = real_fn!(glBegin, BeginFn);
    with_current_runtime(|rt| rt.on_begin());
    real(mode)
}

/// The vertices since glBegin are reported as one draw once the driver has the bracket.
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glEnd() {
    let real = real_fn!(glEnd, EndFn);
    real();
    with_current_runtime(|rt| rt.on_end());
}

vertex_hook!(glVertex2f, Vertex2fFn, (x: GLfloat, y: GLfloat));
vertex_hook!(glVertex3f, Vertex3fFn, (x: GLfloat, y: GLfloat, z: GLfloat));
vertex_hook!(glVertex4f, Vertex4fFn, (x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat));
vertex_hook!(glVertex2d, Vertex2dFn, (x: GLdouble, y: GLdouble));
vertex_hook!(glVertex3d, Vertex3dFn, (x: GLdouble, y: GLdouble, z: GLdouble));
vertex_hook!(glVertex4d, Vertex4dFn, (x: GLdouble, y: GLdouble, z: GLdouble, w: GLdouble));
vertex_hook!(glVertex2i, Vertex2iFn, (x: GLint, y: GLint));
vertex_hook!(glVertex3i, Vertex3iFn, (x: GLint, y: GLint, z: GLint));
vertex_hook!(glVertex4i, Vertex4iFn, (x: GLint, y: GLint, z: GLint, w: GLint));
vertex_hook!(glVertex2s, Vertex2sFn, (x: GLshort, y: GLshort));
vertex_hook!(glVertex3s, Vertex3sFn, (x: GLshort, y: GLshort, z: GLshort));
vertex_hook!(glVertex4s, Vertex4sFn, (x: GLshort, y: GLshort, z: GLshort, w: GLshort));
vertex_hook!(glVertex2fv, VertexfvFn, (v: *const GLfloat));
vertex_hook!(glVertex3fv, VertexfvFn, (v: *const GLfloat));
vertex_hook!(glVertex4fv, VertexfvFn, (v: *const GLfloat));
vertex_hook!(glVertex2dv, VertexdvFn, (v: *const GLdouble));
vertex_hook!(glVertex3dv, VertexdvFn, (v: *const GLdouble));
vertex_hook!(glVertex4dv, VertexdvFn, (v: *const GLdouble));
vertex_hook!(glVertex2iv, VertexivFn, (v: *const GLint));
vertex_hook!(glVertex3iv, VertexivFn, (v: *const GLint));
vertex_hook!(glVertex4iv, VertexivFn, (v: *const GLint));
vertex_hook!(glVertex2sv, VertexsvFn, (v: *const GLshort));
vertex_hook!(glVertex3sv, VertexsvFn, (v: *const GLshort));
vertex_hook!(glVertex4sv, VertexsvFn, (v: *const GLshort));

// framebuffers
unsafe fn bind_framebuffer(real: BindFramebufferFn, target: GLenum, framebuffer: GLuint) {
    real(target, framebuffer);
    if is_draw_target(target) {
        with_current_runtime(|rt| rt.on_bind_framebuffer(framebuffer));
    }
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glBindFramebuffer(target: GLenum, framebuffer: GLuint) {
    let real = real_fn!(glBindFramebuffer, BindFramebufferFn);
    bind_framebuffer(real, target, framebuffer)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glBindFramebufferEXT(target: GLenum, framebuffer: GLuint) {
    let real = real_fn!(glBindFramebufferEXT, BindFramebufferFn);
    bind_framebuffer(real, target, framebuffer)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glFramebufferTexture(
    target: GLenum,
    attachment: GLenum,
    texture: GLuint,
    level: GLint,
) {
    let real = real_fn!(glFramebufferTexture, FramebufferTextureFn);
    real(target, attachment, texture, level);
    track_depth_attachment(target, attachment, ViewHandle::texture(texture), || {
        attached_texture_size(None, texture, level)
    });
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glFramebufferTextureLayer(
    target: GLenum,
    attachment: GLenum,
    texture: GLuint,
    level: GLint,
    layer: GLint,
) {
    let real = real_fn!(glFramebufferTextureLayer, FramebufferTextureLayerFn);
    real(target, attachment, texture, level, layer);
    track_depth_attachment(target, attachment, ViewHandle::texture(texture), || {
        attached_texture_size(None, texture, level)
    });
}

macro_rules! framebuffer_texture_nd {
    ($name:ident) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name(
            target: GLenum,
            attachment: GLenum,
            textarget: GLenum,
            texture: GLuint,
            level: GLint,
        ) {
            let real = real_fn!($name, FramebufferTexture1DFn);
            real(target, attachment, textarget, texture, level);
            track_depth_attachment(target, attachment, ViewHandle::texture(texture), || {
                attached_texture_size(Some(textarget), texture, level)
            });
        }
    };
}

framebuffer_texture_nd!(glFramebufferTexture1D);
framebuffer_texture_nd!(glFramebufferTexture1DEXT);
framebuffer_texture_nd!(glFramebufferTexture2D);
framebuffer_texture_nd!(glFramebufferTexture2DEXT);

macro_rules! framebuffer_texture_3d {
    ($name:ident) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name(
            target: GLenum,
            attachment: GLenum,
            textarget: GLenum,
            texture: GLuint,
            level: GLint,
            zoffset: GLint,
        ) {
            let real = real_fn!($name, FramebufferTexture3DFn);
            real(target, attachment, textarget, texture, level, zoffset);
            track_depth_attachment(target, attachment, ViewHandle::texture(texture), || {
                attached_texture_size(Some(textarget), texture, level)
            });
        }
    };
}

framebuffer_texture_3d!(glFramebufferTexture3D);
framebuffer_texture_3d!(glFramebufferTexture3DEXT);

macro_rules! framebuffer_renderbuffer {
    ($name:ident) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name(
            target: GLenum,
            attachment: GLenum,
            renderbuffertarget: GLenum,
            renderbuffer: GLuint,
        ) {
            let real = real_fn!($name, FramebufferRenderbufferFn);
            real(target, attachment, renderbuffertarget, renderbuffer);
            track_depth_attachment(target, attachment, ViewHandle::renderbuffer(renderbuffer), || {
                gl_query::renderbuffer_size(renderbuffer)
            });
        }
    };
}

framebuffer_renderbuffer!(glFramebufferRenderbuffer);
framebuffer_renderbuffer!(glFramebufferRenderbufferEXT);

// textures
fn texture_format(internalformat: GLint) -> GLint {
    if is_active() {
        promote_internal_format(internalformat)
    } else {
        internalformat
    }
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glTexImage1D(
    target: GLenum,
    level: GLint,
    internalformat: GLint,
    width: GLsizei,
    border: GLint,
    format: GLenum,
    type_: GLenum,
    pixels: *const c_void,
) {
    let real = real_fn!(glTexImage1D, TexImage1DFn);
    real(target, level, texture_format(internalformat), width, border, format, type_, pixels)
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glTexImage2D(
    target: GLenum,
    level: GLint,
    internalformat: GLint,
    width: GLsizei,
    height: GLsizei,
    border: GLint,
    format: GLenum,
    type_: GLenum,
    pixels: *const c_void,
) {
    let real = real_fn!(glTexImage2D, TexImage2DFn);
    real(
        target,
        level,
        texture_format(internalformat),
        width,
        height,
        border,
        format,
        type_,
        pixels,
    )
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glTexImage3D(
    target: GLenum,
    level: GLint,
    internalformat: GLint,
    width: GLsizei,
    height: GLsizei,
    depth: GLsizei,
    border: GLint,
    format: GLenum,
    type_: GLenum,
    pixels: *const c_void,
) {
    let real = real_fn!(glTexImage3D, TexImage3DFn);
    real(
        target,
        level,
        texture_format(internalformat),
        width,
        height,
        depth,
        border,
        format,
        type_,
        pixels,
    )
}

#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glBindTexture(target: GLenum, texture: GLuint) {
    let real = real_fn!(glBindTexture, BindTextureFn);
    real(target, texture);
    with_current_runtime(|rt| rt.on_bind_texture(texture, target));
}

// deletions; names can be reused right away, so the runtime forgets them
#[cfg_attr(windows, no_mangle)]
pub unsafe extern "system" fn glDeleteTextures(n: GLsizei, textures: *const GLuint) {
    let real = real_fn!(glDeleteTextures, DeleteObjectsFn);
    real(n, textures);
    with_current_runtime(|rt| rt.on_delete_textures(object_names(n, textures)));
}

macro_rules! delete_hook {
    ($name:ident, $on_delete:ident) => {
        #[cfg_attr(windows, no_mangle)]
        pub unsafe extern "system" fn $name(n: GLsizei, names: *const GLuint) {
            let real = real_fn!($name, DeleteObjectsFn);
            real(n, names);
            with_current_runtime(|rt| rt.$on_delete(object_names(n, names)));
        }
    };
}

delete_hook!(glDeleteRenderbuffers, on_delete_renderbuffers);
delete_hook!(glDeleteRenderbuffersEXT, on_delete_renderbuffers);
delete_hook!(glDeleteFramebuffers, on_delete_framebuffers);
delete_hook!(glDeleteFramebuffersEXT, on_delete_framebuffers);

forward!(glBindRenderbuffer(target: GLenum, renderbuffer: GLuint));
forward!(glGetIntegerv(pname: GLenum, data: *mut GLint));
forward!(glClear(mask: GLbitfield));
forward!(glViewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei));
forward!(glFlush());
forward!(glFinish());
forward!(glGetError() -> GLenum, 0);
forward!(glIsEnabled(cap: GLenum) -> GLboolean, 0);
