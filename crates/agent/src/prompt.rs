//! System prompt composition.

use parley_core::message::Message;

/// Placeholder substituted with the reply language.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// A system prompt with a `{language}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the template for `language`.
    pub fn render(&self, language: &str) -> String {
        self.template.replace(LANGUAGE_PLACEHOLDER, language)
    }

    /// Render into a system message. Built per request, never stored.
    pub fn system_message(&self, language: &str) -> Message {
        Message::system(self.render(language))
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(parley_config::DEFAULT_SYSTEM_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::message::Role;

    #[test]
    fn default_template_mentions_language() {
        let rendered = PromptTemplate::default().render("French");
        assert!(rendered.contains("in French."));
        assert!(!rendered.contains(LANGUAGE_PLACEHOLDER));
    }

    #[test]
    fn every_placeholder_is_replaced() {
        let t = PromptTemplate::new("{language} only. Answer in {language}.");
        assert_eq!(t.render("German"), "German only. Answer in German.");
    }

    #[test]
    fn system_message_has_system_role() {
        let msg = PromptTemplate::default().system_message("English");
        assert_eq!(msg.role, Role::System);
        assert!(msg.content.contains("English"));
    }
}
