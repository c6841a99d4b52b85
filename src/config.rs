//! Generator configuration

use crate::error::{GlueError, Result};

/// Options that shape the generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Spaces per indentation level in generated code
    pub tab_width: usize,

    /// Emit `const` assertions checking block offsets against `offset_of!`
    pub emit_layout_assertions: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            emit_layout_assertions: true,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    pub fn with_layout_assertions(mut self, enabled: bool) -> Self {
        self.emit_layout_assertions = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tab_width == 0 {
            return Err(GlueError::invalid_argument("tab_width", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.tab_width, 4);
        assert!(config.emit_layout_assertions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::new().with_tab_width(2).with_layout_assertions(false);
        assert_eq!(config.tab_width, 2);
        assert!(!config.emit_layout_assertions);
    }

    #[test]
    fn test_zero_tab_width_is_rejected() {
        let err = GeneratorConfig::new().with_tab_width(0).validate().unwrap_err();
        assert!(matches!(err, GlueError::InvalidArgument { .. }));
    }
}
