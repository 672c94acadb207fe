use runtime::effects::EffectSubsystem;
use shared_gl::types::{FrameRect, GlVersion, SurfaceHandle, WindowHandle};

pub trait HostPlatform: Send + Sync {
    /// Window that owns a surface; None for memory and off-screen surfaces.
    fn window_for_surface(&self, surface: SurfaceHandle) -> Option<WindowHandle>;
    fn client_rect(&self, window: WindowHandle) -> FrameRect;
    /// Version of the context current on the calling thread.
    fn context_version(&self) -> Option<GlVersion>;
    fn create_effects(&self, surface: SurfaceHandle) -> Box<dyn EffectSubsystem>;
    /// Windows without a private device context can hand out a different surface per call.
    fn window_has_own_dc(&self, _window: WindowHandle) -> bool {
        true
    }
}
