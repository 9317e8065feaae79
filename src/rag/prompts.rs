//! Persona prompt template and prompt assembly

use std::collections::HashMap;
use std::path::Path;

use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::rag::context::ContextAssembler;

/// Placeholder the context block is rendered into
pub const CONTEXT_VARIABLE: &str = "context";

/// Built-in persona and behavior rules for the portfolio assistant
pub const DEFAULT_PERSONA_TEMPLATE: &str = r#"You are the Advanced AI Assistant for **Mrigank Singh**, a Full Stack AI Developer and Innovator.
Your goal is to impress recruiters and engineers by accurately showcasing Mrigank's technical depth, innovation, and leadership.

### CORE INSTRUCTIONS:
1. **Identity:** You are NOT Mrigank. You are his digital assistant. Refer to him as "Mrigank" or "he".
2. **Tone:** Professional, confident, and technically precise. Sound like a Software Engineer, not a marketing brochure.
3. **Formatting:** Use **Markdown** to make answers readable.
   - Use **bold** for key technologies or metrics.
   - Use `bullet points` for lists (skills, projects).
   - Do not output large walls of text; break it up.
4. **Source of Truth:** Answer ONLY based on the "CONTEXT" provided below. Do not make up facts.
   - If the answer isn't in the context, say: "I don't have that specific detail, but I can tell you about his patents, his projects or more about him."

### CRITICAL BEHAVIORS:
- **Recruiters:** If asked about hiring, availability, or contact info, explicitly provide his **Email** and **LinkedIn** from the context.
- **Patents:** If asked about innovation, ALWAYS mention his 3 filed patents (Terms & Conditions AI, LexiBot, MealMatch).
- **Group Projects:** Credit **Konal Puri and Aviral Khanna** for DASES/UPES Career Platform. Specify Mrigank's role (Mobile App/Frontend).
- **Technical Depth:** Mention specific algorithms (e.g., "Knapsack Pruning", "Isolation Forests", "Regex Chunking") to show engineering depth.

### CONTEXT FROM KNOWLEDGE BASE:
{{context}}
"#;

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Load a template file; it must reference `{{context}}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let template = Self::new(std::fs::read_to_string(path)?);

        if !template.variables().iter().any(|v| v == CONTEXT_VARIABLE) {
            return Err(PortfolioChatError::ConfigError(format!(
                "prompt template {} has no {{{{{CONTEXT_VARIABLE}}}}} placeholder",
                path.display()
            )));
        }

        Ok(template)
    }

    /// Fill in the template in a single pass.
    ///
    /// Substituted values are never scanned for placeholders; unknown
    /// placeholders are left as written.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            result.push_str(&rest[..start]);
            match values.get(name.trim()) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 4 + len]),
            }
            rest = &rest[start + 4 + len..];
        }

        result.push_str(rest);
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA_TEMPLATE)
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let name = rest[start + 2..start + 2 + len].trim().to_string();
        if !name.is_empty() && !variables.contains(&name) {
            variables.push(name);
        }
        rest = &rest[start + 4 + len..];
    }

    variables
}

/// Builds the full prompt: persona template with the context block, then the question
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    template: PromptTemplate,
    context: ContextAssembler,
}

impl PromptAssembler {
    pub fn new(template: PromptTemplate, context: ContextAssembler) -> Self {
        Self { template, context }
    }

    /// Context block for the given passages
    #[must_use]
    pub fn context_block<S: AsRef<str>>(&self, chunks: &[S]) -> String {
        self.context.assemble(chunks)
    }

    #[must_use]
    pub fn assemble<S: AsRef<str>>(&self, chunks: &[S], query: &str) -> String {
        let context = self.context_block(chunks);
        let values = HashMap::from([(CONTEXT_VARIABLE, context.as_str())]);
        let instructions = self.template.render(&values);

        format!("{instructions}\n\nUser Question: {query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_variables() {
        let template = PromptTemplate::new("Hi {{ name }}, see {{context}} and {{name}}");
        assert_eq!(template.variables(), ["name", "context"]);
        assert_eq!(PromptTemplate::default().variables(), ["context"]);
    }

    #[test]
    fn test_render_single_pass() {
        let template = PromptTemplate::new("A={{a}} B={{b}} C={{c}}");
        let values = HashMap::from([("a", "{{b}}"), ("b", "2")]);
        assert_eq!(template.render(&values), "A={{b}} B=2 C={{c}}");
    }

    #[test]
    fn test_render_unterminated_placeholder() {
        let template = PromptTemplate::new("keep {{open");
        assert_eq!(template.render(&HashMap::new()), "keep {{open");
    }

    #[test]
    fn test_assemble_appends_question() {
        let assembler = PromptAssembler::new(
            PromptTemplate::new("Rules.\nCONTEXT:\n{{context}}"),
            ContextAssembler::default(),
        );

        let prompt = assembler.assemble(&["A", "B"], "What are Mrigank's patents?");
        assert_eq!(
            prompt,
            "Rules.\nCONTEXT:\nA\n\n---\n\nB\n\nUser Question: What are Mrigank's patents?"
        );
    }

    #[test]
    fn test_default_template_embeds_context() {
        let prompt = PromptAssembler::default().assemble(&["Mrigank built DASES."], "DASES?");
        assert!(prompt.starts_with("You are the Advanced AI Assistant for **Mrigank Singh**"));
        assert!(prompt.contains("### CONTEXT FROM KNOWLEDGE BASE:\nMrigank built DASES.\n"));
        assert!(prompt.ends_with("\n\nUser Question: DASES?"));
        assert!(!prompt.contains("{{context}}"));
    }

    #[test]
    fn test_from_file_requires_context_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, "Persona\n{{context}}").unwrap();
        std::fs::write(&bad, "Persona without context").unwrap();

        assert!(PromptTemplate::from_file(&good).is_ok());
        assert!(matches!(
            PromptTemplate::from_file(&bad),
            Err(PortfolioChatError::ConfigError(_))
        ));
    }
}
