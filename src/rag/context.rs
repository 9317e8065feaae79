//! Context assembly from retrieved passages

/// Delimiter placed between passages in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Assembler for creating the context block handed to the model
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    separator: String,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Join passages in retrieval order
    #[must_use]
    pub fn assemble<S: AsRef<str>>(&self, chunks: &[S]) -> String {
        chunks
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(CONTEXT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_preserves_order_and_separator() {
        let context = ContextAssembler::default().assemble(&["A", "B", "C"]);
        assert_eq!(context, "A\n\n---\n\nB\n\n---\n\nC");
    }

    #[test]
    fn test_assemble_single_and_empty() {
        let assembler = ContextAssembler::default();
        assert_eq!(assembler.assemble(&["only"]), "only");
        assert_eq!(assembler.assemble::<&str>(&[]), "");
    }
}
