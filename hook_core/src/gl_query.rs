/*
Size queries for objects attached as depth buffers.  These go straight to the driver and restore
any binding they disturb, so the host never sees them.
 */
use shared_gl::defs_gl::*;

use crate::dispatch::driver_fn;

/// Texture target to bind for an attachment or texture target, and the binding to save.  Cube
/// faces are bound as the cube map.  None for anything we don't know how to bind.
pub(crate) fn bind_target(textarget: GLenum) -> Option<(GLenum, GLenum)> {
    let pair = match textarget {
        GL_TEXTURE_1D => (GL_TEXTURE_1D, GL_TEXTURE_BINDING_1D),
        GL_TEXTURE_2D => (GL_TEXTURE_2D, GL_TEXTURE_BINDING_2D),
        GL_TEXTURE_3D => (GL_TEXTURE_3D, GL_TEXTURE_BINDING_3D),
        GL_TEXTURE_RECTANGLE => (GL_TEXTURE_RECTANGLE, GL_TEXTURE_BINDING_RECTANGLE),
        GL_TEXTURE_1D_ARRAY => (GL_TEXTURE_1D_ARRAY, GL_TEXTURE_BINDING_1D_ARRAY),
        GL_TEXTURE_2D_ARRAY => (GL_TEXTURE_2D_ARRAY, GL_TEXTURE_BINDING_2D_ARRAY),
        GL_TEXTURE_2D_MULTISAMPLE => (GL_TEXTURE_2D_MULTISAMPLE, GL_TEXTURE_BINDING_2D_MULTISAMPLE),
        GL_TEXTURE_2D_MULTISAMPLE_ARRAY => {
            (GL_TEXTURE_2D_MULTISAMPLE_ARRAY, GL_TEXTURE_BINDING_2D_MULTISAMPLE_ARRAY)
        }
        GL_TEXTURE_CUBE_MAP_ARRAY => (GL_TEXTURE_CUBE_MAP_ARRAY, GL_TEXTURE_BINDING_CUBE_MAP_ARRAY),
        GL_TEXTURE_CUBE_MAP | GL_TEXTURE_CUBE_MAP_POSITIVE_X..=GL_TEXTURE_CUBE_MAP_NEGATIVE_Z => {
            (GL_TEXTURE_CUBE_MAP, GL_TEXTURE_BINDING_CUBE_MAP)
        }
        _ => return None,
    };
    Some(pair)
}

fn to_size(w: GLint, h: GLint) -> Option<(u32, u32)> {
    if w <= 0 || h <= 0 {
        None
    } else {
        Some((w as u32, h as u32))
    }
}

/// Width and height of `level` of `texture`.  `textarget` is the attachment target, or the
/// texture's own target when the host attached it without one.  With no target at all only the
/// direct-state query is tried: binding a texture to a target it wasn't created with raises an
/// error the host would see.
///
/// # Safety
/// A context must be current on the calling thread.
pub unsafe fn texture_size(textarget: Option<GLenum>, texture: GLuint, level: GLint) -> Option<(u32, u32)> {
    let textarget = match textarget {
        Some(t) => t,
        None => {
            let get: GetTextureLevelParameterivFn = driver_fn("glGetTextureLevelParameteriv")?;
            let (mut w, mut h) = (0, 0);
            get(texture, level, GL_TEXTURE_WIDTH, &mut w);
            get(texture, level, GL_TEXTURE_HEIGHT, &mut h);
            return to_size(w, h);
        }
    };

    let (target, binding) = bind_target(textarget)?;
    // level parameters of a cube map live on its faces
    let query_target = if textarget == GL_TEXTURE_CUBE_MAP {
        GL_TEXTURE_CUBE_MAP_POSITIVE_X
    } else {
        textarget
    };
    let get_integer: GetIntegervFn = driver_fn("glGetIntegerv")?;
    let bind: BindTextureFn = driver_fn("glBindTexture")?;
    let get_level: GetTexLevelParameterivFn = driver_fn("glGetTexLevelParameteriv")?;

    let mut previous: GLint = 0;
    get_integer(binding, &mut previous);
    bind(target, texture);
    let (mut w, mut h) = (0, 0);
    get_level(query_target, level, GL_TEXTURE_WIDTH, &mut w);
    get_level(query_target, level, GL_TEXTURE_HEIGHT, &mut h);
    bind(target, previous as GLuint);
    to_size(w, h)
}

/// # Safety
/// A context must be current on the calling thread.
pub unsafe fn renderbuffer_size(renderbuffer: GLuint) -> Option<(u32, u32)> {
    let get_integer: GetIntegervFn = driver_fn("glGetIntegerv")?;
    let bind: BindRenderbufferFn = driver_fn("glBindRenderbuffer")?;
    let get_param: GetRenderbufferParameterivFn = driver_fn("glGetRenderbufferParameteriv")?;

    let mut previous: GLint = 0;
    get_integer(GL_RENDERBUFFER_BINDING, &mut previous);
    bind(GL_RENDERBUFFER, renderbuffer);
    let (mut w, mut h) = (0, 0);
    get_param(GL_RENDERBUFFER, GL_RENDERBUFFER_WIDTH, &mut w);
    get_param(GL_RENDERBUFFER, GL_RENDERBUFFER_HEIGHT, &mut h);
    bind(GL_RENDERBUFFER, previous as GLuint);
    to_size(w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_bind_targets() {
        assert_eq!(bind_target(GL_TEXTURE_2D), Some((GL_TEXTURE_2D, GL_TEXTURE_BINDING_2D)));
        assert_eq!(
            bind_target(GL_TEXTURE_CUBE_MAP_POSITIVE_X + 3),
            Some((GL_TEXTURE_CUBE_MAP, GL_TEXTURE_BINDING_CUBE_MAP))
        );
        assert_eq!(bind_target(GL_TEXTURE_CUBE_MAP), bind_target(GL_TEXTURE_CUBE_MAP_NEGATIVE_Z));
        assert_eq!(bind_target(GL_TEXTURE_3D).map(|b| b.1), Some(GL_TEXTURE_BINDING_3D));
        assert_eq!(bind_target(GL_RENDERBUFFER), None);
    }

    #[test]
    fn test_sizes_restore_bindings() {
        let _t = test_support::setup();
        test_support::set_texture(9, 1024, 768);
        test_support::set_renderbuffer(4, 640, 480);
        test_support::set_bound_texture(GL_TEXTURE_2D, 2);
        test_support::set_bound_renderbuffer(1);

        unsafe {
            assert_eq!(texture_size(Some(GL_TEXTURE_2D), 9, 0), Some((1024, 768)));
            assert_eq!(texture_size(Some(GL_TEXTURE_2D), 77, 0), None);
            assert_eq!(renderbuffer_size(4), Some((640, 480)));
        }
        assert_eq!(test_support::bound_texture(GL_TEXTURE_2D), 2);
        assert_eq!(test_support::bound_renderbuffer(), 1);
    }

    #[test]
    fn test_unknown_target_is_never_bound() {
        let _t = test_support::setup();
        test_support::set_texture_target(5, GL_TEXTURE_2D_ARRAY);
        test_support::set_texture(5, 64, 64);

        unsafe {
            // no DSA entry in the fake driver and no target: nothing to ask
            assert_eq!(texture_size(None, 5, 0), None);
            assert!(test_support::take_calls().is_empty());
            assert_eq!(test_support::pending_error(), GL_NO_ERROR);

            assert_eq!(texture_size(Some(GL_TEXTURE_2D_ARRAY), 5, 0), Some((64, 64)));
            assert_eq!(test_support::pending_error(), GL_NO_ERROR);
        }
        assert_eq!(test_support::bound_texture(GL_TEXTURE_2D_ARRAY), 0);
    }

    #[test]
    fn test_cube_map_sized_by_face() {
        let _t = test_support::setup();
        test_support::set_texture_target(6, GL_TEXTURE_CUBE_MAP);
        test_support::set_texture(6, 512, 512);
        unsafe {
            assert_eq!(texture_size(Some(GL_TEXTURE_CUBE_MAP), 6, 0), Some((512, 512)));
            assert_eq!(texture_size(Some(GL_TEXTURE_CUBE_MAP_POSITIVE_X + 2), 6, 0), Some((512, 512)));
        }
        assert_eq!(test_support::pending_error(), GL_NO_ERROR);
    }
}
