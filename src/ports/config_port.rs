//! Run configuration source.

/// Read access to `[section] key = value` settings. Section and key lookups
/// are case-insensitive.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Lowercased names of every section present.
    fn sections(&self) -> Vec<String>;
}
