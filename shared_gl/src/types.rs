/*
Handle and value types shared by the registry, the context maps and the hooks.  Native handles
are stored as plain words so the maps are `Send` and usable off-Windows in tests.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! native_handle {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub usize);

        impl $name {
            pub const NULL: $name = $name(0);

            pub fn from_ptr<T>(p: *mut T) -> Self {
                $name(p as usize)
            }
            pub fn as_ptr<T>(&self) -> *mut T {
                self.0 as *mut T
            }
            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

// HDC
native_handle!(SurfaceHandle);
// HGLRC
native_handle!(ContextHandle);
// HWND
native_handle!(WindowHandle);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// The depth buffer of the default (window) framebuffer.
    Default,
    Texture,
    Renderbuffer,
}

/// A depth buffer that can be attached to a framebuffer.  Texture and renderbuffer names live in
/// different namespaces, so the kind is part of the identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ViewHandle {
    pub kind: ViewKind,
    pub name: u32,
}

impl ViewHandle {
    pub const DEFAULT: ViewHandle = ViewHandle {
        kind: ViewKind::Default,
        name: 0,
    };

    pub fn texture(name: u32) -> Self {
        ViewHandle {
            kind: ViewKind::Texture,
            name,
        }
    }
    pub fn renderbuffer(name: u32) -> Self {
        ViewHandle {
            kind: ViewKind::Renderbuffer,
            name,
        }
    }
}

/// Last observed client area size of a window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FrameRect {
    pub width: u32,
    pub height: u32,
}

impl FrameRect {
    pub fn new(width: u32, height: u32) -> Self {
        FrameRect { width, height }
    }
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    pub major: i32,
    pub minor: i32,
}

impl GlVersion {
    pub const fn new(major: i32, minor: i32) -> Self {
        GlVersion { major, minor }
    }
}

impl Default for GlVersion {
    fn default() -> Self {
        GlVersion::new(4, 3)
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
