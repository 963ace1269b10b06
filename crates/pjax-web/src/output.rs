//! Nested output buffering for a single response body.
//!
//! Rendering code writes into the innermost active level. Levels only move
//! their content on explicit calls; there is no implicit flushing.

#[derive(Debug, Default)]
struct OutputLevel {
    buffer: String,
    removable: bool,
}

#[derive(Debug, Default)]
pub struct OutputStack {
    body: String,
    levels: Vec<OutputLevel>,
}

impl OutputStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new capture level.
    pub fn start(&mut self) {
        self.levels.push(OutputLevel {
            buffer: String::new(),
            removable: true,
        });
    }

    /// Opens a level that refuses `end_clean`, as a compression handler
    /// installed by the hosting server would.
    pub fn start_locked(&mut self) {
        self.levels.push(OutputLevel {
            buffer: String::new(),
            removable: false,
        });
    }

    pub fn level(&self) -> usize {
        self.levels.len()
    }

    pub fn write(&mut self, s: &str) {
        match self.levels.last_mut() {
            Some(level) => level.buffer.push_str(s),
            None => self.body.push_str(s),
        }
    }

    pub fn contents(&self) -> &str {
        self.levels
            .last()
            .map(|level| level.buffer.as_str())
            .unwrap_or(self.body.as_str())
    }

    /// Removes the innermost level and returns what it captured.
    pub fn get_clean(&mut self) -> Option<String> {
        if !self.levels.last()?.removable {
            return None;
        }
        self.levels.pop().map(|level| level.buffer)
    }

    /// Discards the innermost level. Returns `false` when there is no level or
    /// the level cannot be removed.
    pub fn end_clean(&mut self) -> bool {
        match self.levels.last() {
            Some(level) if level.removable => {
                self.levels.pop();
                true
            }
            _ => false,
        }
    }

    /// Empties the innermost level without removing it.
    pub fn clean(&mut self) -> bool {
        match self.levels.last_mut() {
            Some(level) => {
                level.buffer.clear();
                true
            }
            None => false,
        }
    }

    /// Closes every level into its parent and returns the finished body.
    pub fn into_body(mut self) -> String {
        while let Some(level) = self.levels.pop() {
            self.write(&level.buffer);
        }
        self.body
    }
}
