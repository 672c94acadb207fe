/*
Presentation-model checks for pixel format requests.  Layer planes can't be post-processed, so
requests for them are refused; single buffering is allowed through with a warning.
 */
use shared_gl::defs_gl::*;
use shared_gl::error::{HookError, Result};

/// Read a zero-terminated list of (attribute, value) pairs.
///
/// # Safety
/// `list` must be null or point at a zero-terminated attribute list.
pub unsafe fn attrib_pairs(list: *const INT) -> Vec<(INT, INT)> {
    let mut pairs = vec![];
    if list.is_null() {
        return pairs;
    }
    let mut p = list;
    while *p != 0 {
        pairs.push((*p, *p.add(1)));
        p = p.add(2);
    }
    pairs
}

/// Flatten pairs back into a zero-terminated list.
pub fn attrib_list(pairs: &[(INT, INT)]) -> Vec<INT> {
    let mut list = Vec::with_capacity(pairs.len() * 2 + 1);
    for (k, v) in pairs.iter() {
        list.push(*k);
        list.push(*v);
    }
    list.push(0);
    list
}

/// Warnings to log for an acceptable descriptor, or an error if it asks for layer planes.
pub fn check_descriptor(pfd: &PIXELFORMATDESCRIPTOR) -> Result<Vec<String>> {
    if pfd.iLayerType != PFD_MAIN_PLANE || pfd.bReserved != 0 {
        return Err(HookError::UnsupportedConfiguration(format!(
            "layered contexts of type {} ({} overlay/underlay planes) are not supported",
            pfd.iLayerType, pfd.bReserved
        )));
    }
    let mut warnings = vec![];
    if pfd.dwFlags & PFD_DOUBLEBUFFER == 0 {
        warnings.push("single buffered contexts are not supported".to_owned());
    }
    Ok(warnings)
}

pub fn check_attribs(pairs: &[(INT, INT)]) -> Result<Vec<String>> {
    let mut layered = false;
    let mut double_buffered = false;
    for (k, v) in pairs.iter() {
        match *k {
            WGL_SWAP_LAYER_BUFFERS_ARB | WGL_NUMBER_OVERLAYS_ARB | WGL_NUMBER_UNDERLAYS_ARB => {
                layered = layered || *v != 0
            }
            WGL_DOUBLE_BUFFER_ARB => double_buffered = *v != FALSE,
            _ => {}
        }
    }
    if layered {
        return Err(HookError::UnsupportedConfiguration(
            "layered contexts are not supported".to_owned(),
        ));
    }
    let mut warnings = vec![];
    if !double_buffered {
        warnings.push("single buffered contexts are not supported".to_owned());
    }
    Ok(warnings)
}

fn attrib_name(key: INT) -> Option<&'static str> {
    let name = match key {
        WGL_DRAW_TO_WINDOW_ARB => "WGL_DRAW_TO_WINDOW_ARB",
        WGL_DRAW_TO_BITMAP_ARB => "WGL_DRAW_TO_BITMAP_ARB",
        WGL_ACCELERATION_ARB => "WGL_ACCELERATION_ARB",
        WGL_SWAP_LAYER_BUFFERS_ARB => "WGL_SWAP_LAYER_BUFFERS_ARB",
        WGL_SWAP_METHOD_ARB => "WGL_SWAP_METHOD_ARB",
        WGL_NUMBER_OVERLAYS_ARB => "WGL_NUMBER_OVERLAYS_ARB",
        WGL_NUMBER_UNDERLAYS_ARB => "WGL_NUMBER_UNDERLAYS_ARB",
        WGL_SUPPORT_GDI_ARB => "WGL_SUPPORT_GDI_ARB",
        WGL_SUPPORT_OPENGL_ARB => "WGL_SUPPORT_OPENGL_ARB",
        WGL_DOUBLE_BUFFER_ARB => "WGL_DOUBLE_BUFFER_ARB",
        WGL_STEREO_ARB => "WGL_STEREO_ARB",
        WGL_COLOR_BITS_ARB => "WGL_COLOR_BITS_ARB",
        WGL_RED_BITS_ARB => "WGL_RED_BITS_ARB",
        WGL_GREEN_BITS_ARB => "WGL_GREEN_BITS_ARB",
        WGL_BLUE_BITS_ARB => "WGL_BLUE_BITS_ARB",
        WGL_ALPHA_BITS_ARB => "WGL_ALPHA_BITS_ARB",
        WGL_DEPTH_BITS_ARB => "WGL_DEPTH_BITS_ARB",
        WGL_STENCIL_BITS_ARB => "WGL_STENCIL_BITS_ARB",
        WGL_DRAW_TO_PBUFFER_ARB => "WGL_DRAW_TO_PBUFFER_ARB",
        WGL_SAMPLE_BUFFERS_ARB => "WGL_SAMPLE_BUFFERS_ARB",
        WGL_SAMPLES_ARB => "WGL_SAMPLES_ARB",
        WGL_CONTEXT_MAJOR_VERSION_ARB => "WGL_CONTEXT_MAJOR_VERSION_ARB",
        WGL_CONTEXT_MINOR_VERSION_ARB => "WGL_CONTEXT_MINOR_VERSION_ARB",
        WGL_CONTEXT_LAYER_PLANE_ARB => "WGL_CONTEXT_LAYER_PLANE_ARB",
        WGL_CONTEXT_FLAGS_ARB => "WGL_CONTEXT_FLAGS_ARB",
        WGL_CONTEXT_PROFILE_MASK_ARB => "WGL_CONTEXT_PROFILE_MASK_ARB",
        _ => return None,
    };
    Some(name)
}

/// One line per attribute, for the trace dump.
pub fn describe_attribs(pairs: &[(INT, INT)]) -> Vec<String> {
    pairs
        .iter()
        .map(|(k, v)| match attrib_name(*k) {
            Some(name) => format!(">   {:<40} {}", name, v),
            None => format!(">   {:<40} {:#x}", format!("{:#x}", k), v),
        })
        .collect()
}

pub fn describe_descriptor(pfd: &PIXELFORMATDESCRIPTOR) -> Vec<String> {
    vec![
        format!(">   {:<40} {:#x}", "Flags", pfd.dwFlags),
        format!(">   {:<40} {}", "ColorBits", pfd.cColorBits),
        format!(">   {:<40} {}", "DepthBits", pfd.cDepthBits),
        format!(">   {:<40} {}", "StencilBits", pfd.cStencilBits),
        format!(">   {:<40} {}", "LayerType", pfd.iLayerType),
    ]
}
