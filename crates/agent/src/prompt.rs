//! System prompt rendering.

use askama::Template;
use shopdesk_core::{Category, Customer, CustomerRole, Language};

/// Channel the prompt is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Text,
    Voice,
}

#[derive(Template)]
#[template(path = "system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    customer_name: &'a str,
    customer_role: CustomerRole,
    is_admin: bool,
    language: &'static str,
    categories: String,
    voice: bool,
}

/// Render the system prompt for a customer, language, and channel.
///
/// `customer` is `None` only if the catalog has no customers at all.
#[must_use]
pub fn render_system_prompt(
    customer: Option<&Customer>,
    language: Language,
    channel: Channel,
) -> String {
    let template = SystemPromptTemplate {
        customer_name: customer.map_or("a guest", |c| c.name.as_str()),
        customer_role: customer.map_or(CustomerRole::Customer, |c| c.role),
        is_admin: customer.is_some_and(|c| c.role == CustomerRole::Admin),
        language: language.name(),
        categories: Category::ALL
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        voice: channel == Channel::Voice,
    };
    template.render().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "system prompt failed to render, using fallback");
        format!(
            "You are a helpful store support assistant. Answer in {}.",
            language.name()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogService;
    use shopdesk_core::CustomerId;

    #[test]
    fn test_prompt_names_customer_and_language() {
        let catalog = CatalogService::demo();
        let alex = catalog.customer(CustomerId::new(1)).expect("customer");
        let prompt = render_system_prompt(Some(&alex), Language::Spanish, Channel::Text);

        assert!(prompt.contains("Alex Rivera (customer)"));
        assert!(prompt.contains("Always answer in Spanish"));
        assert!(prompt.contains("Tops, Bottoms, Footwear, Outerwear, Accessories"));
        assert!(prompt.contains("text chat"));
        assert!(!prompt.contains("store staff"));
    }

    #[test]
    fn test_voice_prompt_for_admin() {
        let catalog = CatalogService::demo();
        let jordan = catalog.customer(CustomerId::new(2)).expect("admin");
        let prompt = render_system_prompt(Some(&jordan), Language::English, Channel::Voice);

        assert!(prompt.contains("store staff"));
        assert!(prompt.contains("live voice call"));
    }

    #[test]
    fn test_prompt_without_customer() {
        let prompt = render_system_prompt(None, Language::German, Channel::Text);
        assert!(prompt.contains("a guest"));
        assert!(prompt.contains("German"));
    }
}
