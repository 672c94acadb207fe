/*
GL and WGL scalar types, the handful of enum values the hooks inspect, and the function pointer
types of every entry that is called through.  Handles are declared as raw pointers here rather
than pulled from winapi so the hook signatures are the same on every target.
 */
use std::os::raw::{c_char, c_void};

pub type GLenum = u32;
pub type GLboolean = u8;
pub type GLbitfield = u32;
pub type GLint = i32;
pub type GLuint = u32;
pub type GLsizei = i32;
pub type GLfloat = f32;
pub type GLdouble = f64;
pub type GLshort = i16;
pub type GLintptr = isize;
pub type GLsizeiptr = isize;

pub type BOOL = i32;
pub type UINT = u32;
pub type INT = i32;
pub type FLOAT = f32;
pub type DWORD = u32;
pub type COLORREF = u32;
pub type LPCSTR = *const c_char;
pub type PROC = *const c_void;

pub type HDC = *mut c_void;
pub type HGLRC = *mut c_void;
pub type HWND = *mut c_void;
pub type HPBUFFERARB = *mut c_void;

pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;

// primitives and data types
pub const GL_TRIANGLES: GLenum = 0x0004;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_UNSIGNED_INT: GLenum = 0x1405;
pub const GL_FLOAT: GLenum = 0x1406;

// texture formats
pub const GL_RED: GLenum = 0x1903;
pub const GL_RG: GLenum = 0x8227;
pub const GL_RGB: GLenum = 0x1907;
pub const GL_RGBA: GLenum = 0x1908;
pub const GL_R8: GLenum = 0x8229;
pub const GL_RG8: GLenum = 0x822B;
pub const GL_RGB8: GLenum = 0x8051;
pub const GL_RGBA8: GLenum = 0x8058;
pub const GL_DEPTH_COMPONENT: GLenum = 0x1902;
pub const GL_DEPTH_COMPONENT16: GLenum = 0x81A5;
pub const GL_DEPTH_STENCIL: GLenum = 0x84F9;
pub const GL_DEPTH24_STENCIL8: GLenum = 0x88F0;

// framebuffers
pub const GL_FRAMEBUFFER: GLenum = 0x8D40;
pub const GL_READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const GL_DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const GL_DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const GL_DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;
pub const GL_RENDERBUFFER: GLenum = 0x8D41;
pub const GL_RENDERBUFFER_WIDTH: GLenum = 0x8D42;
pub const GL_RENDERBUFFER_HEIGHT: GLenum = 0x8D43;
pub const GL_RENDERBUFFER_BINDING: GLenum = 0x8CA7;

// texture targets and their binding queries
pub const GL_TEXTURE_1D: GLenum = 0x0DE0;
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_TEXTURE_3D: GLenum = 0x806F;
pub const GL_TEXTURE_RECTANGLE: GLenum = 0x84F5;
pub const GL_TEXTURE_2D_ARRAY: GLenum = 0x8C1A;
pub const GL_TEXTURE_2D_MULTISAMPLE: GLenum = 0x9100;
pub const GL_TEXTURE_CUBE_MAP: GLenum = 0x8513;
pub const GL_TEXTURE_1D_ARRAY: GLenum = 0x8C18;
pub const GL_TEXTURE_CUBE_MAP_ARRAY: GLenum = 0x9009;
pub const GL_TEXTURE_2D_MULTISAMPLE_ARRAY: GLenum = 0x9102;
pub const GL_TEXTURE_CUBE_MAP_POSITIVE_X: GLenum = 0x8515;
pub const GL_TEXTURE_CUBE_MAP_NEGATIVE_Z: GLenum = 0x851A;
pub const GL_TEXTURE_BINDING_1D: GLenum = 0x8068;
pub const GL_TEXTURE_BINDING_2D: GLenum = 0x8069;
pub const GL_TEXTURE_BINDING_3D: GLenum = 0x806A;
pub const GL_TEXTURE_BINDING_RECTANGLE: GLenum = 0x84F6;
pub const GL_TEXTURE_BINDING_2D_ARRAY: GLenum = 0x8C1D;
pub const GL_TEXTURE_BINDING_2D_MULTISAMPLE: GLenum = 0x9104;
pub const GL_TEXTURE_BINDING_CUBE_MAP: GLenum = 0x8514;
pub const GL_TEXTURE_BINDING_1D_ARRAY: GLenum = 0x8C1C;
pub const GL_TEXTURE_BINDING_CUBE_MAP_ARRAY: GLenum = 0x900A;
pub const GL_TEXTURE_BINDING_2D_MULTISAMPLE_ARRAY: GLenum = 0x9105;
pub const GL_TEXTURE_WIDTH: GLenum = 0x1000;
pub const GL_TEXTURE_HEIGHT: GLenum = 0x1001;

// errors
pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;

pub const GL_MAJOR_VERSION: GLenum = 0x821B;
pub const GL_MINOR_VERSION: GLenum = 0x821C;

// pixel format descriptor flags
pub const PFD_DOUBLEBUFFER: DWORD = 0x0000_0001;
pub const PFD_DRAW_TO_WINDOW: DWORD = 0x0000_0004;
pub const PFD_SUPPORT_OPENGL: DWORD = 0x0000_0020;
pub const PFD_MAIN_PLANE: u8 = 0;

pub const WGL_SWAP_MAIN_PLANE: UINT = 0x0000_0001;

// WGL_ARB_pixel_format
pub const WGL_DRAW_TO_WINDOW_ARB: i32 = 0x2001;
pub const WGL_DRAW_TO_BITMAP_ARB: i32 = 0x2002;
pub const WGL_ACCELERATION_ARB: i32 = 0x2003;
pub const WGL_SWAP_LAYER_BUFFERS_ARB: i32 = 0x2006;
pub const WGL_SWAP_METHOD_ARB: i32 = 0x2007;
pub const WGL_NUMBER_OVERLAYS_ARB: i32 = 0x2008;
pub const WGL_NUMBER_UNDERLAYS_ARB: i32 = 0x2009;
pub const WGL_SUPPORT_GDI_ARB: i32 = 0x200F;
pub const WGL_SUPPORT_OPENGL_ARB: i32 = 0x2010;
pub const WGL_DOUBLE_BUFFER_ARB: i32 = 0x2011;
pub const WGL_STEREO_ARB: i32 = 0x2012;
pub const WGL_COLOR_BITS_ARB: i32 = 0x2014;
pub const WGL_RED_BITS_ARB: i32 = 0x2015;
pub const WGL_GREEN_BITS_ARB: i32 = 0x2017;
pub const WGL_BLUE_BITS_ARB: i32 = 0x2019;
pub const WGL_ALPHA_BITS_ARB: i32 = 0x201B;
pub const WGL_DEPTH_BITS_ARB: i32 = 0x2022;
pub const WGL_STENCIL_BITS_ARB: i32 = 0x2023;
pub const WGL_DRAW_TO_PBUFFER_ARB: i32 = 0x202D;
pub const WGL_SAMPLE_BUFFERS_ARB: i32 = 0x2041;
pub const WGL_SAMPLES_ARB: i32 = 0x2042;

// WGL_ARB_create_context
pub const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
pub const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
pub const WGL_CONTEXT_LAYER_PLANE_ARB: i32 = 0x2093;
pub const WGL_CONTEXT_FLAGS_ARB: i32 = 0x2094;
pub const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
pub const WGL_CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
pub const WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: i32 = 0x0002;
pub const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;
pub const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: i32 = 0x0002;

// win32 error codes reported through SetLastError
pub const ERROR_INVALID_HANDLE: DWORD = 6;
pub const ERROR_INVALID_DATA: DWORD = 13;
pub const ERROR_GEN_FAILURE: DWORD = 31;
pub const ERROR_NOT_SUPPORTED: DWORD = 50;
pub const ERROR_INVALID_PARAMETER: DWORD = 87;
pub const ERROR_BUSY: DWORD = 170;
pub const ERROR_INVALID_PIXEL_FORMAT: DWORD = 2000;
pub const ERROR_DC_NOT_FOUND: DWORD = 0x7D5;
pub const ERROR_NO_SYSTEM_RESOURCES: DWORD = 1450;
pub const ERROR_INVALID_VERSION_ARB: DWORD = 0x2095;
pub const ERROR_INVALID_PROFILE_ARB: DWORD = 0x2096;

/// Readable name for a `GetLastError` code, for the log.
pub fn error_name(code: DWORD) -> String {
    let name = match code {
        ERROR_INVALID_HANDLE => "ERROR_INVALID_HANDLE",
        ERROR_INVALID_DATA => "ERROR_INVALID_DATA",
        ERROR_GEN_FAILURE => "ERROR_GEN_FAILURE",
        ERROR_NOT_SUPPORTED => "ERROR_NOT_SUPPORTED",
        ERROR_INVALID_PARAMETER => "ERROR_INVALID_PARAMETER",
        ERROR_BUSY => "ERROR_BUSY",
        ERROR_DC_NOT_FOUND => "ERROR_DC_NOT_FOUND",
        ERROR_NO_SYSTEM_RESOURCES => "ERROR_NO_SYSTEM_RESOURCES",
        ERROR_INVALID_PIXEL_FORMAT => "ERROR_INVALID_PIXEL_FORMAT",
        ERROR_INVALID_VERSION_ARB => "ERROR_INVALID_VERSION_ARB",
        ERROR_INVALID_PROFILE_ARB => "ERROR_INVALID_PROFILE_ARB",
        _ => return format!("{:#x}", code),
    };
    format!("{} ({:#x})", name, code)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct PIXELFORMATDESCRIPTOR {
    pub nSize: u16,
    pub nVersion: u16,
    pub dwFlags: DWORD,
    pub iPixelType: u8,
    pub cColorBits: u8,
    pub cRedBits: u8,
    pub cRedShift: u8,
    pub cGreenBits: u8,
    pub cGreenShift: u8,
    pub cBlueBits: u8,
    pub cBlueShift: u8,
    pub cAlphaBits: u8,
    pub cAlphaShift: u8,
    pub cAccumBits: u8,
    pub cAccumRedBits: u8,
    pub cAccumGreenBits: u8,
    pub cAccumBlueBits: u8,
    pub cAccumAlphaBits: u8,
    pub cDepthBits: u8,
    pub cStencilBits: u8,
    pub cAuxBuffers: u8,
    pub iLayerType: u8,
    pub bReserved: u8,
    pub dwLayerMask: DWORD,
    pub dwVisibleMask: DWORD,
    pub dwDamageMask: DWORD,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct WGLSWAP {
    pub hdc: HDC,
    pub uiFlags: UINT,
}

// immediate mode
pub type BeginFn = unsafe extern "system" fn(mode: GLenum);
pub type EndFn = unsafe extern "system" fn();
pub type Vertex2fFn = unsafe extern "system" fn(x: GLfloat, y: GLfloat);
pub type Vertex3fFn = unsafe extern "system" fn(x: GLfloat, y: GLfloat, z: GLfloat);
pub type Vertex4fFn = unsafe extern "system" fn(x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
pub type Vertex2dFn = unsafe extern "system" fn(x: GLdouble, y: GLdouble);
pub type Vertex3dFn = unsafe extern "system" fn(x: GLdouble, y: GLdouble, z: GLdouble);
pub type Vertex2iFn = unsafe extern "system" fn(x: GLint, y: GLint);
pub type Vertex3iFn = unsafe extern "system" fn(x: GLint, y: GLint, z: GLint);
pub type Vertex4dFn = unsafe extern "system" fn(x: GLdouble, y: GLdouble, z: GLdouble, w: GLdouble);
pub type Vertex4iFn = unsafe extern "system" fn(x: GLint, y: GLint, z: GLint, w: GLint);
pub type Vertex2sFn = unsafe extern "system" fn(x: GLshort, y: GLshort);
pub type Vertex3sFn = unsafe extern "system" fn(x: GLshort, y: GLshort, z: GLshort);
pub type Vertex4sFn = unsafe extern "system" fn(x: GLshort, y: GLshort, z: GLshort, w: GLshort);
pub type VertexfvFn = unsafe extern "system" fn(v: *const GLfloat);
pub type VertexdvFn = unsafe extern "system" fn(v: *const GLdouble);
pub type VertexivFn = unsafe extern "system" fn(v: *const GLint);
pub type VertexsvFn = unsafe extern "system" fn(v: *const GLshort);

// draws
pub type DrawArraysFn = unsafe extern "system" fn(mode: GLenum, first: GLint, count: GLsizei);
pub type DrawArraysInstancedFn =
    unsafe extern "system" fn(mode: GLenum, first: GLint, count: GLsizei, primcount: GLsizei);
pub type DrawArraysInstancedBaseInstanceFn = unsafe extern "system" fn(
    mode: GLenum,
    first: GLint,
    count: GLsizei,
    primcount: GLsizei,
    baseinstance: GLuint,
);
pub type DrawArraysIndirectFn = unsafe extern "system" fn(mode: GLenum, indirect: *const c_void);
pub type DrawElementsFn =
    unsafe extern "system" fn(mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void);
pub type DrawElementsBaseVertexFn = unsafe extern "system" fn(
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    basevertex: GLint,
);
pub type DrawElementsInstancedFn = unsafe extern "system" fn(
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    primcount: GLsizei,
);
pub type DrawElementsInstancedBaseVertexFn = unsafe extern "system" fn(
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    primcount: GLsizei,
    basevertex: GLint,
);
pub type DrawElementsInstancedBaseInstanceFn = unsafe extern "system" fn(
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    primcount: GLsizei,
    baseinstance: GLuint,
);
pub type DrawElementsInstancedBaseVertexBaseInstanceFn = unsafe extern "system" fn(
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    primcount: GLsizei,
    basevertex: GLint,
    baseinstance: GLuint,
);
pub type DrawElementsIndirectFn =
    unsafe extern "system" fn(mode: GLenum, type_: GLenum, indirect: *const c_void);
pub type DrawRangeElementsFn = unsafe extern "system" fn(
    mode: GLenum,
    start: GLuint,
    end: GLuint,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
);
pub type DrawRangeElementsBaseVertexFn = unsafe extern "system" fn(
    mode: GLenum,
    start: GLuint,
    end: GLuint,
    count: GLsizei,
    type_: GLenum,
    indices: *const c_void,
    basevertex: GLint,
);
pub type MultiDrawArraysFn = unsafe extern "system" fn(
    mode: GLenum,
    first: *const GLint,
    count: *const GLsizei,
    drawcount: GLsizei,
);
pub type MultiDrawElementsFn = unsafe extern "system" fn(
    mode: GLenum,
    count: *const GLsizei,
    type_: GLenum,
    indices: *const *const c_void,
    drawcount: GLsizei,
);
pub type MultiDrawElementsBaseVertexFn = unsafe extern "system" fn(
    mode: GLenum,
    count: *const GLsizei,
    type_: GLenum,
    indices: *const *const c_void,
    drawcount: GLsizei,
    basevertex: *const GLint,
);
pub type MultiDrawArraysIndirectFn = unsafe extern "system" fn(
    mode: GLenum,
    indirect: *const c_void,
    drawcount: GLsizei,
    stride: GLsizei,
);
pub type MultiDrawElementsIndirectFn = unsafe extern "system" fn(
    mode: GLenum,
    type_: GLenum,
    indirect: *const c_void,
    drawcount: GLsizei,
    stride: GLsizei,
);

// framebuffer objects
pub type BindFramebufferFn = unsafe extern "system" fn(target: GLenum, framebuffer: GLuint);
pub type FramebufferTextureFn =
    unsafe extern "system" fn(target: GLenum, attachment: GLenum, texture: GLuint, level: GLint);
pub type FramebufferTexture1DFn = unsafe extern "system" fn(
    target: GLenum,
    attachment: GLenum,
    textarget: GLenum,
    texture: GLuint,
    level: GLint,
);
pub type FramebufferTexture2DFn = FramebufferTexture1DFn;
pub type FramebufferTexture3DFn = unsafe extern "system" fn(
    target: GLenum,
    attachment: GLenum,
    textarget: GLenum,
    texture: GLuint,
    level: GLint,
    zoffset: GLint,
);
pub type FramebufferTextureLayerFn = unsafe extern "system" fn(
    target: GLenum,
    attachment: GLenum,
    texture: GLuint,
    level: GLint,
    layer: GLint,
);
pub type FramebufferRenderbufferFn = unsafe extern "system" fn(
    target: GLenum,
    attachment: GLenum,
    renderbuffertarget: GLenum,
    renderbuffer: GLuint,
);

// textures
pub type TexImage1DFn = unsafe extern "system" fn(
    target: GLenum,
    level: GLint,
    internalformat: GLint,
    width: GLsizei,
    border: GLint,
    format: GLenum,
    type_: GLenum,
    pixels: *const c_void,
);
pub type TexImage2DFn = unsafe extern "system" fn(
    target: GLenum,
    level: GLint,
    internalformat: GLint,
    width: GLsizei,
    height: GLsizei,
    border: GLint,
    format: GLenum,
    type_: GLenum,
    pixels: *const c_void,
);
pub type TexImage3DFn = unsafe extern "system" fn(
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
);

// state queries used to size depth attachments
pub type GetIntegervFn = unsafe extern "system" fn(pname: GLenum, data: *mut GLint);
pub type BindTextureFn = unsafe extern "system" fn(target: GLenum, texture: GLuint);
pub type GetTexLevelParameterivFn =
    unsafe extern "system" fn(target: GLenum, level: GLint, pname: GLenum, params: *mut GLint);
pub type GetTextureLevelParameterivFn =
    unsafe extern "system" fn(texture: GLuint, level: GLint, pname: GLenum, params: *mut GLint);
pub type BindRenderbufferFn = unsafe extern "system" fn(target: GLenum, renderbuffer: GLuint);

// object deletion, shared by textures, renderbuffers and framebuffers
pub type DeleteObjectsFn = unsafe extern "system" fn(n: GLsizei, names: *const GLuint);
pub type GetRenderbufferParameterivFn =
    unsafe extern "system" fn(target: GLenum, pname: GLenum, params: *mut GLint);

// wgl
pub type ChoosePixelFormatFn =
    unsafe extern "system" fn(hdc: HDC, ppfd: *const PIXELFORMATDESCRIPTOR) -> INT;
pub type ChoosePixelFormatARBFn = unsafe extern "system" fn(
    hdc: HDC,
    piAttribIList: *const INT,
    pfAttribFList: *const FLOAT,
    nMaxFormats: UINT,
    piFormats: *mut INT,
    nNumFormats: *mut UINT,
) -> BOOL;
pub type SetPixelFormatFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    ppfd: *const PIXELFORMATDESCRIPTOR,
) -> BOOL;
pub type GetPixelFormatFn = unsafe extern "system" fn(hdc: HDC) -> INT;
pub type DescribePixelFormatFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    nBytes: UINT,
    ppfd: *mut PIXELFORMATDESCRIPTOR,
) -> INT;
pub type GetPixelFormatAttribivARBFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    iLayerPlane: INT,
    nAttributes: UINT,
    piAttributes: *const INT,
    piValues: *mut INT,
) -> BOOL;
pub type GetPixelFormatAttribfvARBFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    iLayerPlane: INT,
    nAttributes: UINT,
    piAttributes: *const INT,
    pfValues: *mut FLOAT,
) -> BOOL;
pub type CreateContextFn = unsafe extern "system" fn(hdc: HDC) -> HGLRC;
pub type CreateLayerContextFn = unsafe extern "system" fn(hdc: HDC, iLayerPlane: INT) -> HGLRC;
pub type CreateContextAttribsARBFn =
    unsafe extern "system" fn(hdc: HDC, hShareContext: HGLRC, attribList: *const INT) -> HGLRC;
pub type DeleteContextFn = unsafe extern "system" fn(hglrc: HGLRC) -> BOOL;
pub type MakeCurrentFn = unsafe extern "system" fn(hdc: HDC, hglrc: HGLRC) -> BOOL;
pub type ShareListsFn = unsafe extern "system" fn(hglrc1: HGLRC, hglrc2: HGLRC) -> BOOL;
pub type GetCurrentContextFn = unsafe extern "system" fn() -> HGLRC;
pub type GetCurrentDCFn = unsafe extern "system" fn() -> HDC;
pub type SwapBuffersFn = unsafe extern "system" fn(hdc: HDC) -> BOOL;
pub type SwapLayerBuffersFn = unsafe extern "system" fn(hdc: HDC, fuPlanes: UINT) -> BOOL;
pub type SwapMultipleBuffersFn = unsafe extern "system" fn(cNumBuffers: UINT, pBuffers: *const WGLSWAP) -> DWORD;
pub type DescribeLayerPlaneFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    iLayerPlane: INT,
    nBytes: UINT,
    plpd: *mut c_void,
) -> BOOL;
pub type GetLayerPaletteEntriesFn = unsafe extern "system" fn(
    hdc: HDC,
    iLayerPlane: INT,
    iStart: INT,
    cEntries: INT,
    pcr: *mut COLORREF,
) -> INT;
pub type SetLayerPaletteEntriesFn = unsafe extern "system" fn(
    hdc: HDC,
    iLayerPlane: INT,
    iStart: INT,
    cEntries: INT,
    pcr: *const COLORREF,
) -> INT;
pub type RealizeLayerPaletteFn =
    unsafe extern "system" fn(hdc: HDC, iLayerPlane: INT, bRealize: BOOL) -> BOOL;
pub type CreatePbufferARBFn = unsafe extern "system" fn(
    hdc: HDC,
    iPixelFormat: INT,
    iWidth: INT,
    iHeight: INT,
    piAttribList: *const INT,
) -> HPBUFFERARB;
pub type DestroyPbufferARBFn = unsafe extern "system" fn(hPbuffer: HPBUFFERARB) -> BOOL;
pub type GetPbufferDCARBFn = unsafe extern "system" fn(hPbuffer: HPBUFFERARB) -> HDC;
pub type ReleasePbufferDCARBFn = unsafe extern "system" fn(hPbuffer: HPBUFFERARB, hdc: HDC) -> INT;
pub type GetProcAddressFn = unsafe extern "system" fn(lpszProc: LPCSTR) -> PROC;
