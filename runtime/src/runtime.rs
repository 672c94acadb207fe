use fnv::FnvHashMap;

use shared_gl::error::{HookError, Result};
use shared_gl::types::{ContextHandle, SurfaceHandle, ViewHandle};
use shared_gl::util::write_log_file;

use crate::depth::{DepthCandidate, DepthTracker};
use crate::effects::{EffectSubsystem, TechniqueSet};

#[derive(Debug, Clone)]
pub struct EffectSource {
    pub source: String,
    pub pragmas: Vec<String>,
}

/// The add-on object bound to one presentable surface.  Created uninitialized; the first
/// present that sees a usable window size initializes it.
pub struct Runtime {
    surface: SurfaceHandle,
    share_root: ContextHandle,
    width: u32,
    height: u32,
    initialized: bool,
    retired: bool,
    depth: DepthTracker,
    /// texture name -> target it was first bound to; fixed for the texture's lifetime
    texture_targets: FnvHashMap<u32, u32>,
    /// Vertices submitted since glBegin, None outside a begin/end pair.
    immediate_vertices: Option<u64>,
    effects: Box<dyn EffectSubsystem>,
    effect_source: Option<EffectSource>,
    techniques: TechniqueSet,
    frame_count: u64,
    last_depth: Option<DepthCandidate>,
}

impl Runtime {
    pub fn new(
        surface: SurfaceHandle,
        share_root: ContextHandle,
        effects: Box<dyn EffectSubsystem>,
        effect_source: Option<EffectSource>,
        depth_detection: bool,
    ) -> Self {
        Runtime {
            surface,
            share_root,
            width: 0,
            height: 0,
            initialized: false,
            retired: false,
            depth: DepthTracker::new(depth_detection),
            texture_targets: FnvHashMap::default(),
            immediate_vertices: None,
            effects,
            effect_source,
            techniques: vec![],
            frame_count: 0,
            last_depth: None,
        }
    }

    pub fn on_init(&mut self, width: u32, height: u32) -> Result<()> {
        if self.retired {
            return Err(HookError::ResizeRace);
        }
        if width == 0 || height == 0 {
            return Err(HookError::RuntimeInitFailed(format!(
                "degenerate back buffer {}x{}",
                width, height
            )));
        }

        self.width = width;
        self.height = height;
        self.depth.reset_default(width, height);
        self.effects.on_resize(width, height);

        self.techniques = match self.effect_source.as_ref() {
            None => vec![],
            Some(src) => match self.effects.compile(&src.source, &src.pragmas) {
                Ok(set) => set,
                Err(diag) => {
                    write_log_file(&format!(
                        "Error: effect compile failed for surface {:x}, running without effects:\n{}",
                        self.surface.0, diag
                    ));
                    vec![]
                }
            },
        };

        self.initialized = true;
        write_log_file(&format!(
            "runtime for surface {:x} (share root {:x}) initialized at {}x{} with {} techniques",
            self.surface.0,
            self.share_root.0,
            width,
            height,
            self.techniques.len()
        ));
        Ok(())
    }

    pub fn on_reset(&mut self) {
        if !self.initialized {
            return;
        }
        self.effects.on_teardown();
        self.techniques.clear();
        self.depth.clear();
        self.immediate_vertices = None;
        self.last_depth = None;
        self.initialized = false;
        write_log_file(&format!("runtime for surface {:x} reset", self.surface.0));
    }

    /// Mark the runtime as removed from the context map.  A retired runtime never
    /// initializes again.
    pub fn retire(&mut self) {
        self.on_reset();
        self.retired = true;
    }

    /// Once per frame: pick the depth source, run the enabled techniques, then clear the
    /// per-frame counters.
    pub fn on_present(&mut self) -> Option<DepthCandidate> {
        if !self.initialized {
            self.depth.end_frame(self.width, self.height);
            return None;
        }

        let selected = self.depth.end_frame(self.width, self.height);
        if selected.map(|s| s.view) != self.last_depth.map(|s| s.view) {
            match selected {
                Some(s) => write_log_file(&format!(
                    "surface {:x}: depth source is now {:?} ({}x{}, {} draws, {} vertices)",
                    self.surface.0, s.view, s.width, s.height, s.draw_call_count, s.vertex_count
                )),
                None => write_log_file(&format!(
                    "surface {:x}: no depth source matches {}x{}",
                    self.surface.0, self.width, self.height
                )),
            }
        }
        self.last_depth = selected;

        for tech in self.techniques.iter() {
            if !tech.enabled || (tech.uses_depth && selected.is_none()) {
                continue;
            }
            self.effects.apply(tech);
        }
        self.frame_count += 1;
        selected
    }

    pub fn on_draw_call(&mut self, vertices: u64) {
        self.depth.on_draw(vertices);
    }

    pub fn on_begin(&mut self) {
        self.immediate_vertices = Some(0);
    }

    pub fn on_vertex(&mut self) {
        if let Some(n) = self.immediate_vertices.as_mut() {
            *n += 1;
        }
    }

    /// Report the glBegin/glEnd bracket as one draw.
    pub fn on_end(&mut self) {
        if let Some(n) = self.immediate_vertices.take() {
            self.on_draw_call(n);
        }
    }

    pub fn on_bind_framebuffer(&mut self, framebuffer: u32) {
        self.depth.on_bind_framebuffer(framebuffer);
    }

    pub fn on_depth_attachment(&mut self, view: Option<ViewHandle>, width: u32, height: u32) {
        match view {
            Some(v) => self.depth.on_depth_attachment(v, width, height),
            None => self.depth.on_depth_detach(),
        }
    }

    pub fn on_bind_texture(&mut self, texture: u32, target: u32) {
        if texture != 0 {
            self.texture_targets.entry(texture).or_insert(target);
        }
    }

    pub fn texture_target(&self, texture: u32) -> Option<u32> {
        self.texture_targets.get(&texture).copied()
    }

    pub fn on_delete_textures(&mut self, textures: &[u32]) {
        for t in textures {
            self.texture_targets.remove(t);
        }
        let views: Vec<ViewHandle> = textures.iter().map(|&t| ViewHandle::texture(t)).collect();
        self.depth.on_delete_views(&views);
    }

    pub fn on_delete_renderbuffers(&mut self, renderbuffers: &[u32]) {
        let views: Vec<ViewHandle> = renderbuffers.iter().map(|&r| ViewHandle::renderbuffer(r)).collect();
        self.depth.on_delete_views(&views);
    }

    pub fn on_delete_framebuffers(&mut self, framebuffers: &[u32]) {
        self.depth.on_delete_framebuffers(framebuffers);
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }
    pub fn share_root(&self) -> ContextHandle {
        self.share_root
    }
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
    pub fn is_retired(&self) -> bool {
        self.retired
    }
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
    pub fn techniques(&self) -> &TechniqueSet {
        &self.techniques
    }
    pub fn depth(&self) -> &DepthTracker {
        &self.depth
    }
}
