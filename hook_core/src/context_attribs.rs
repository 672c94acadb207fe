use shared_gl::defs_gl::*;
use shared_gl::types::GlVersion;

use crate::pixel_format::attrib_list;

#[derive(Debug, PartialEq, Eq)]
pub struct ContextRequest {
    /// Zero-terminated list to pass to the driver.
    pub attribs: Vec<INT>,
    pub requested: GlVersion,
    pub compatibility: bool,
    /// The version was raised to the floor.
    pub upgraded: bool,
}

/// Rewrite a `wglCreateContextAttribsARB` attribute list.  The profile mask is always made
/// explicit, and when `upgrade` is set a version below `floor` is replaced by `floor` with the
/// compatibility profile, so old fixed-function code keeps working.
pub fn upgrade_attribs(pairs: &[(INT, INT)], floor: GlVersion, upgrade: bool) -> ContextRequest {
    let mut major = 1;
    let mut minor = 0;
    let mut compatibility = false;
    let mut out: Vec<(INT, INT)> = Vec::with_capacity(pairs.len() + 3);

    for (k, v) in pairs.iter() {
        match *k {
            WGL_CONTEXT_MAJOR_VERSION_ARB => major = *v,
            WGL_CONTEXT_MINOR_VERSION_ARB => minor = *v,
            WGL_CONTEXT_PROFILE_MASK_ARB => {
                compatibility = (*v & WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB) != 0;
                continue;
            }
            _ => {}
        }
        out.push((*k, *v));
    }

    let requested = GlVersion::new(major, minor);
    let upgraded = upgrade && requested < floor;
    if upgraded {
        compatibility = true;
        let mut set = |key: INT, value: INT| match out.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => out.push((key, value)),
        };
        set(WGL_CONTEXT_MAJOR_VERSION_ARB, floor.major);
        set(WGL_CONTEXT_MINOR_VERSION_ARB, floor.minor);
    }

    out.push((
        WGL_CONTEXT_PROFILE_MASK_ARB,
        if compatibility {
            WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB
        } else {
            WGL_CONTEXT_CORE_PROFILE_BIT_ARB
        },
    ));

    ContextRequest {
        attribs: attrib_list(&out),
        requested,
        compatibility,
        upgraded,
    }
}
