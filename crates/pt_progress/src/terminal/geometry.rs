/// Terminal dimensions as last observed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    /// Current width in columns
    pub width: u16,
    /// Current height in rows
    pub height: u16,
    /// Width before the last change
    pub previous_width: u16,
    /// Set when the width changed and no render pass has seen it yet
    pub changed: bool,
}

impl TerminalGeometry {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            previous_width: width,
            changed: false,
        }
    }

    /// Records a newly observed size.
    ///
    /// Returns `true` when the width differs from the current one; a height-only
    /// change is stored but does not affect the bars.
    pub fn update(&mut self, width: u16, height: u16) -> bool {
        self.height = height;
        if width == self.width {
            return false;
        }
        self.previous_width = self.width;
        self.width = width;
        self.changed = true;
        true
    }

    /// Clears the change flag, returning whether it was set.
    pub fn take_change(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}
