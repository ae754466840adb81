use crate::session::error::SessionError;

/// The three stacked-view containers a frame can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewContainer {
    /// Tabbed library root: songs / albums / playlists / artists.
    MainTabs,
    /// Detail views layered over the tabs: album, playlist, artist, search
    /// results, settings.
    SubView,
    /// Full-window overlays: now-playing and video.
    Overlay,
}

/// One entry in the navigation history: which container is active and which
/// child slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub container: ViewContainer,
    pub slot: usize,
}

impl Frame {
    pub const fn new(container: ViewContainer, slot: usize) -> Self {
        Self { container, slot }
    }
}

/// The root the stack always keeps: first tab of the library.
pub const ROOT: Frame = Frame::new(ViewContainer::MainTabs, 0);
/// Full-window now-playing view.
pub const NOW_PLAYING: Frame = Frame::new(ViewContainer::Overlay, 0);
/// Full-window video view, only ever entered from now-playing.
pub const VIDEO: Frame = Frame::new(ViewContainer::Overlay, 1);

/// Enumerated collapse pairs: when a frame from the left-hand container is
/// popped and the right-hand frame surfaces, that frame is skipped too in the
/// same back-action. The now-playing overlay is never a valid landing target
/// for back-navigation from a tab or detail view; only the video overlay
/// lands on it.
const COLLAPSE_PAIRS: &[(ViewContainer, Frame)] = &[
    (ViewContainer::MainTabs, NOW_PLAYING),
    (ViewContainer::SubView, NOW_PLAYING),
];

fn also_skip(popped: &Frame, landing: &Frame) -> bool {
    COLLAPSE_PAIRS
        .iter()
        .any(|(container, skip)| popped.container == *container && landing == skip)
}

/// Navigation history, oldest first. Mutated only by push and pop; never
/// reordered. Always holds at least the root frame.
#[derive(Debug)]
pub struct NavigationStack {
    frames: Vec<Frame>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStack {
    pub fn new() -> Self {
        Self { frames: vec![ROOT] }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> &Frame {
        self.frames.last().expect("stack always holds the root")
    }

    /// Append a frame unless the top already equals it; re-selecting the
    /// active tab must not grow the stack.
    pub fn push(&mut self, frame: Frame) {
        if *self.top() == frame {
            return;
        }
        self.frames.push(frame);
    }

    /// Pop the top frame. The root is never popped.
    pub fn pop(&mut self) -> Result<Frame, SessionError> {
        if self.frames.len() <= 1 {
            return Err(SessionError::StackUnderflow);
        }
        Ok(self.frames.pop().expect("checked depth above"))
    }

    /// One logical back-action: pop, then apply the collapse table so the
    /// back-navigation never lands on a transient frame. Returns the frame to
    /// route the view layer to.
    pub fn back(&mut self) -> Result<Frame, SessionError> {
        let popped = self.pop()?;
        while self.frames.len() > 1 && also_skip(&popped, self.top()) {
            self.frames.pop();
        }
        Ok(*self.top())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUM_DETAIL: Frame = Frame::new(ViewContainer::SubView, 2);

    #[test]
    fn push_is_idempotent_on_reentry() {
        let mut nav = NavigationStack::new();
        nav.push(ALBUM_DETAIL);
        nav.push(ALBUM_DETAIL);
        assert_eq!(nav.depth(), 2);
        assert_eq!(*nav.top(), ALBUM_DETAIL);
    }

    #[test]
    fn root_is_never_popped() {
        let mut nav = NavigationStack::new();
        assert!(matches!(nav.pop(), Err(SessionError::StackUnderflow)));
        assert_eq!(nav.depth(), 1);
        assert_eq!(*nav.top(), ROOT);
    }

    #[test]
    fn back_collapses_through_now_playing() {
        let mut nav = NavigationStack::new();
        nav.push(NOW_PLAYING);
        nav.push(ALBUM_DETAIL);
        assert_eq!(nav.depth(), 3);

        // Popping the detail view skips the now-playing frame beneath it:
        // one back-action drops the depth by two.
        let landed = nav.back().unwrap();
        assert_eq!(landed, ROOT);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn video_lands_on_now_playing() {
        let mut nav = NavigationStack::new();
        nav.push(NOW_PLAYING);
        nav.push(VIDEO);

        let landed = nav.back().unwrap();
        assert_eq!(landed, NOW_PLAYING);
        assert_eq!(nav.depth(), 2);
    }
}
