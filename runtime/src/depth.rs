/*
Picks the depth buffer the host renders its scene into.  Every depth attachment seen in a frame
gets a candidate entry; draws are charged to whichever candidate belongs to the bound
framebuffer.  At present time the busiest candidate with the back buffer's size wins.
 */
use fnv::FnvHashMap;

use shared_gl::types::ViewHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DepthCandidate {
    pub view: ViewHandle,
    pub width: u32,
    pub height: u32,
    pub draw_call_count: u32,
    pub vertex_count: u64,
    /// Bind sequence number, used to break ties in favor of the latest binding.
    pub last_bound: u64,
}

pub struct DepthTracker {
    candidates: FnvHashMap<ViewHandle, DepthCandidate>,
    /// framebuffer name -> depth view attached to it
    attachments: FnvHashMap<u32, ViewHandle>,
    bound_framebuffer: u32,
    bind_seq: u64,
    enabled: bool,
}

impl DepthTracker {
    pub fn new(enabled: bool) -> Self {
        DepthTracker {
            candidates: FnvHashMap::default(),
            attachments: FnvHashMap::default(),
            bound_framebuffer: 0,
            bind_seq: 0,
            enabled,
        }
    }

    /// Register the window's own depth buffer at the back buffer size.  Called whenever the
    /// runtime (re)initializes.
    pub fn reset_default(&mut self, width: u32, height: u32) {
        self.attachments.insert(0, ViewHandle::DEFAULT);
        let seq = self.next_seq();
        let cand = self.entry(ViewHandle::DEFAULT);
        cand.width = width;
        cand.height = height;
        cand.last_bound = seq;
    }

    pub fn on_bind_framebuffer(&mut self, framebuffer: u32) {
        self.bound_framebuffer = framebuffer;
        if let Some(view) = self.attachments.get(&framebuffer).copied() {
            let seq = self.next_seq();
            if let Some(cand) = self.candidates.get_mut(&view) {
                cand.last_bound = seq;
            }
        }
    }

    /// A depth view was attached to the bound draw framebuffer.
    pub fn on_depth_attachment(&mut self, view: ViewHandle, width: u32, height: u32) {
        let seq = self.next_seq();
        let cand = self.entry(view);
        cand.width = width;
        cand.height = height;
        cand.last_bound = seq;
        self.attachments.insert(self.bound_framebuffer, view);
    }

    /// Depth attachment of the bound draw framebuffer was set to 0.
    pub fn on_depth_detach(&mut self) {
        self.attachments.remove(&self.bound_framebuffer);
    }

    /// Framebuffers deleted by the host.  Their names may come back for unrelated objects, and
    /// deleting the bound one reverts the binding to the window.
    pub fn on_delete_framebuffers(&mut self, framebuffers: &[u32]) {
        for &fb in framebuffers.iter().filter(|&&fb| fb != 0) {
            self.attachments.remove(&fb);
            if self.bound_framebuffer == fb {
                self.bound_framebuffer = 0;
            }
        }
    }

    /// Textures or renderbuffers deleted by the host; their candidates go with them.
    pub fn on_delete_views(&mut self, views: &[ViewHandle]) {
        for view in views.iter().filter(|v| v.name != 0) {
            self.candidates.remove(view);
            self.attachments.retain(|_, attached| attached != view);
        }
    }

    pub fn on_draw(&mut self, vertices: u64) {
        let view = match self.attachments.get(&self.bound_framebuffer) {
            Some(v) => *v,
            None => return,
        };
        if let Some(cand) = self.candidates.get_mut(&view) {
            cand.draw_call_count = cand.draw_call_count.saturating_add(1);
            cand.vertex_count = cand.vertex_count.saturating_add(vertices);
        }
    }

    /// Best candidate for a back buffer of the given size, without clearing anything.  Only
    /// candidates of exactly that size are eligible.
    pub fn select(&self, width: u32, height: u32) -> Option<DepthCandidate> {
        if !self.enabled {
            return None;
        }
        self.candidates
            .values()
            .filter(|c| c.width == width && c.height == height)
            .max_by_key(|c| (c.vertex_count, c.last_bound))
            .copied()
    }

    /// Select for this frame, then zero every counter.  Membership is kept.
    pub fn end_frame(&mut self, width: u32, height: u32) -> Option<DepthCandidate> {
        let selected = self.select(width, height);
        for cand in self.candidates.values_mut() {
            cand.draw_call_count = 0;
            cand.vertex_count = 0;
        }
        selected
    }

    pub fn candidate(&self, view: ViewHandle) -> Option<&DepthCandidate> {
        self.candidates.get(&view)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn bound_framebuffer(&self) -> u32 {
        self.bound_framebuffer
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.attachments.clear();
        self.bound_framebuffer = 0;
    }

    fn next_seq(&mut self) -> u64 {
        self.bind_seq += 1;
        self.bind_seq
    }

    fn entry(&mut self, view: ViewHandle) -> &mut DepthCandidate {
        self.candidates.entry(view).or_insert(DepthCandidate {
            view,
            width: 0,
            height: 0,
            draw_call_count: 0,
            vertex_count: 0,
            last_bound: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_n(t: &mut DepthTracker, fbo: u32, draws: u32, verts_each: u64) {
        t.on_bind_framebuffer(fbo);
        for _ in 0..draws {
            t.on_draw(verts_each);
        }
    }

    fn attach(t: &mut DepthTracker, fbo: u32, view: ViewHandle, w: u32, h: u32) {
        t.on_bind_framebuffer(fbo);
        t.on_depth_attachment(view, w, h);
    }

    #[test]
    fn test_select_busiest_matching_size() {
        let mut t = DepthTracker::new(true);
        attach(&mut t, 1, ViewHandle::texture(10), 256, 256);
        attach(&mut t, 2, ViewHandle::texture(11), 1920, 1080);
        attach(&mut t, 3, ViewHandle::renderbuffer(12), 1920, 1080);

        draw_n(&mut t, 1, 50, 3);
        draw_n(&mut t, 2, 10, 3);
        draw_n(&mut t, 3, 40, 3);

        let sel = t.select(1920, 1080).expect("expected a selection");
        assert_eq!(sel.view, ViewHandle::renderbuffer(12));
        assert_eq!(sel.draw_call_count, 40);
        assert_eq!(sel.vertex_count, 120);
    }

    #[test]
    fn test_no_size_match_selects_none() {
        let mut t = DepthTracker::new(true);
        attach(&mut t, 1, ViewHandle::texture(10), 256, 256);
        draw_n(&mut t, 1, 500, 3);
        assert!(t.end_frame(1920, 1080).is_none());
    }

    #[test]
    fn test_tie_goes_to_latest_bound() {
        let mut t = DepthTracker::new(true);
        attach(&mut t, 1, ViewHandle::texture(1), 800, 600);
        attach(&mut t, 2, ViewHandle::texture(2), 800, 600);
        draw_n(&mut t, 2, 4, 6);
        draw_n(&mut t, 1, 4, 6);
        assert_eq!(t.select(800, 600).unwrap().view, ViewHandle::texture(1));
        // rebinding the other one without drawing flips the tie
        t.on_bind_framebuffer(2);
        assert_eq!(t.select(800, 600).unwrap().view, ViewHandle::texture(2));
    }

    #[test]
    fn test_end_frame_resets_counters_keeps_members() {
        let mut t = DepthTracker::new(true);
        t.reset_default(640, 480);
        attach(&mut t, 7, ViewHandle::texture(3), 640, 480);
        draw_n(&mut t, 7, 3, 100);
        draw_n(&mut t, 0, 1, 6);

        assert_eq!(t.end_frame(640, 480).unwrap().view, ViewHandle::texture(3));
        assert_eq!(t.candidate_count(), 2);
        let c = t.candidate(ViewHandle::texture(3)).unwrap();
        assert_eq!((c.draw_call_count, c.vertex_count), (0, 0));

        // next frame the window depth buffer is busier
        draw_n(&mut t, 0, 2, 6);
        assert_eq!(t.end_frame(640, 480).unwrap().view, ViewHandle::DEFAULT);
    }

    #[test]
    fn test_detach_and_unknown_framebuffer() {
        let mut t = DepthTracker::new(true);
        attach(&mut t, 4, ViewHandle::texture(9), 100, 100);
        t.on_depth_detach();
        draw_n(&mut t, 4, 10, 3);
        draw_n(&mut t, 99, 10, 3);
        let c = t.candidate(ViewHandle::texture(9)).unwrap();
        assert_eq!(c.draw_call_count, 0);
    }

    #[test]
    fn test_deleted_objects_are_pruned() {
        let mut t = DepthTracker::new(true);
        t.reset_default(800, 600);
        attach(&mut t, 5, ViewHandle::texture(20), 800, 600);
        attach(&mut t, 6, ViewHandle::renderbuffer(20), 800, 600);
        assert_eq!(t.candidate_count(), 3);

        // framebuffer 5 deleted while bound; its name comes back with nothing attached
        t.on_bind_framebuffer(5);
        t.on_delete_framebuffers(&[5, 0]);
        assert_eq!(t.bound_framebuffer(), 0);
        draw_n(&mut t, 5, 10, 3);
        assert_eq!(t.candidate(ViewHandle::texture(20)).unwrap().draw_call_count, 0);

        t.on_delete_views(&[ViewHandle::renderbuffer(20)]);
        assert!(t.candidate(ViewHandle::renderbuffer(20)).is_none());
        // same name, other namespace
        assert!(t.candidate(ViewHandle::texture(20)).is_some());
        draw_n(&mut t, 6, 10, 3);
        assert_eq!(t.select(800, 600).unwrap().view, ViewHandle::texture(20));

        t.on_delete_views(&[ViewHandle::texture(20)]);
        assert_eq!(t.candidate_count(), 1);
        assert_eq!(t.select(800, 600).unwrap().view, ViewHandle::DEFAULT);
    }

    #[test]
    fn test_disabled_never_selects() {
        let mut t = DepthTracker::new(false);
        t.reset_default(640, 480);
        draw_n(&mut t, 0, 1, 3);
        assert!(t.end_frame(640, 480).is_none());
    }
}
