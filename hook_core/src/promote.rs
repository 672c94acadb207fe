use shared_gl::defs_gl::*;

/// Sized equivalent for an unsized internal format.  Sized formats pass through unchanged.
pub fn promote_internal_format(internalformat: GLint) -> GLint {
    let promoted = match internalformat as GLenum {
        GL_RED => GL_R8,
        GL_RG => GL_RG8,
        GL_RGB => GL_RGB8,
        GL_RGBA => GL_RGBA8,
        GL_DEPTH_COMPONENT => GL_DEPTH_COMPONENT16,
        GL_DEPTH_STENCIL => GL_DEPTH24_STENCIL8,
        other => other,
    };
    promoted as GLint
}
