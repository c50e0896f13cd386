/// Sentinel for "no recursion limit"
pub const UNLIMITED_DEPTH: i32 = -1;

/// Recursion budget and high-water mark for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionState {
    max_depth: i32,
    deepest: usize,
}

impl RecursionState {
    pub fn new(max_depth: i32) -> Self {
        Self {
            max_depth,
            deepest: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(UNLIMITED_DEPTH)
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_depth < 0
    }

    /// Whether a nested structure at `depth` is within budget
    pub fn allows(&self, depth: usize) -> bool {
        match usize::try_from(self.max_depth) {
            Ok(max) => depth <= max,
            Err(_) => true,
        }
    }

    /// Record that traversal entered a structure at `depth`
    pub fn reach(&mut self, depth: usize) {
        self.deepest = self.deepest.max(depth);
    }

    /// Deepest nesting level entered so far
    pub fn deepest(&self) -> usize {
        self.deepest
    }
}

impl Default for RecursionState {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Accumulated result of scanning every argument of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanVerdict {
    matched: Vec<String>,
    depth_exceeded: bool,
}

impl ScanVerdict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_match(&mut self, text: impl Into<String>) {
        self.matched.push(text.into());
    }

    pub fn mark_depth_exceeded(&mut self) {
        self.depth_exceeded = true;
    }

    /// Disallowed strings in traversal order
    pub fn matched(&self) -> &[String] {
        &self.matched
    }

    pub fn has_matches(&self) -> bool {
        !self.matched.is_empty()
    }

    pub fn depth_exceeded(&self) -> bool {
        self.depth_exceeded
    }

    pub fn is_clean(&self) -> bool {
        !self.depth_exceeded && self.matched.is_empty()
    }

    pub fn into_matches(self) -> Vec<String> {
        self.matched
    }
}
