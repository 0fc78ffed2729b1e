//! Navigation sink

/// Trait for navigation sinks
///
/// The wizard compares server redirect hints against [`Navigator::current_path`]
/// and only navigates when they differ.
pub trait Navigator: Send + Sync {
    /// Path the client currently occupies
    fn current_path(&self) -> String;

    /// Navigate to `path`
    fn navigate_to(&self, path: &str);
}
