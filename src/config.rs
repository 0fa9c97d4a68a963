//! Tunables carried by every root object.

/// Default bound on the parent chain walked by length propagation.
///
/// Message, list and element make three levels; the fourth leaves room for
/// one composite nested inside an element.
pub const DEFAULT_MAX_PARENT_DEPTH: usize = 4;

/// Largest encodable OpenFlow message: the header length field is 16 bits.
pub const WIRE_BUFFER_MAX_LENGTH: usize = u16::MAX as usize;

/// Per-tree configuration.
///
/// Duplicates inherit the configuration of their source.
///
/// # Example
///
/// ```
/// use ofp_wire::config::ObjectConfig;
///
/// let config = ObjectConfig::new().with_max_parent_depth(6);
/// assert_eq!(config.max_parent_depth, 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectConfig {
    /// Maximum number of objects, the starting one included, that length
    /// propagation may visit. Exceeding it is a fatal contract violation.
    pub max_parent_depth: usize,
}

impl ObjectConfig {
    /// Configuration with the default depth bound.
    pub const fn new() -> Self {
        ObjectConfig {
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
        }
    }

    /// Replace the depth bound.
    pub const fn with_max_parent_depth(mut self, depth: usize) -> Self {
        self.max_parent_depth = depth;
        self
    }
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_depth() {
        assert_eq!(ObjectConfig::default().max_parent_depth, 4);
        assert_eq!(ObjectConfig::default(), ObjectConfig::new());
    }

    #[test]
    fn test_max_length_matches_length_field() {
        assert_eq!(WIRE_BUFFER_MAX_LENGTH, 0xFFFF);
    }
}
