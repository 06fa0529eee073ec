/// Compilation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Adds `Offset`/`Length` members to every concrete class that does not declare them.
    pub generate_locations: bool,
    /// Raises pipeline logging from `debug` to `info`. Never changes the output.
    pub verbose: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_locations(mut self, enabled: bool) -> Self {
        self.generate_locations = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub(crate) fn log_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}
