//! Shared application context.

use std::sync::Arc;

use parking_lot::RwLock;
use shopdesk_core::{Customer, CustomerId, Language};
use tokio::sync::watch;

use crate::catalog::CatalogService;
use crate::config::AgentConfig;
use crate::prompt::{Channel, render_system_prompt};
use crate::shop::{Shop, ShopError};
use crate::support::{SimulatedSupportDesk, SupportDesk};
use crate::tools::ToolDispatcher;

/// Everything a channel needs: catalog, shop, support desk, language, and
/// the session epoch.
///
/// The epoch increases whenever the active customer or the language
/// changes. Conversations remember the epoch they were built under and are
/// stale once it moves.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    catalog: CatalogService,
    shop: Shop,
    support: Arc<dyn SupportDesk>,
    language: RwLock<Language>,
    epoch: watch::Sender<u64>,
}

impl AppContext {
    #[must_use]
    pub fn new(shop: Shop, support: Arc<dyn SupportDesk>, language: Language) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                catalog: shop.catalog().clone(),
                shop,
                support,
                language: RwLock::new(language),
                epoch: watch::Sender::new(0),
            }),
        }
    }

    /// Build the demo context described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownCustomer` if the configured customer is not
    /// in the catalog, or if the catalog has no customers.
    pub fn from_config(config: &AgentConfig) -> Result<Self, ShopError> {
        let catalog = CatalogService::demo();
        let customer_id = match config.customer_id {
            Some(id) => catalog
                .customer(id)
                .map(|c| c.id)
                .ok_or(ShopError::UnknownCustomer(id))?,
            None => catalog
                .customers()
                .first()
                .map(|c| c.id)
                .ok_or(ShopError::UnknownCustomer(CustomerId::new(0)))?,
        };
        let shop = Shop::new(catalog, customer_id);
        let support = Arc::new(SimulatedSupportDesk::new(config.support_latency));
        Ok(Self::new(shop, support, config.language))
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn shop(&self) -> &Shop {
        &self.inner.shop
    }

    #[must_use]
    pub fn support(&self) -> &Arc<dyn SupportDesk> {
        &self.inner.support
    }

    #[must_use]
    pub fn language(&self) -> Language {
        *self.inner.language.read()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.inner.epoch.borrow()
    }

    /// Notified on every epoch change.
    #[must_use]
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.inner.epoch.subscribe()
    }

    /// The active customer's record.
    #[must_use]
    pub fn active_customer(&self) -> Option<Customer> {
        self.catalog().customer(self.shop().active_customer())
    }

    /// Switch the active customer, ending current conversations.
    ///
    /// Switching to the customer who is already active changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownCustomer` for ids not in the catalog.
    pub fn switch_customer(&self, customer_id: CustomerId) -> Result<Customer, ShopError> {
        let previous = self.shop().active_customer();
        let customer = self.shop().switch_customer(customer_id)?;
        if previous != customer_id {
            self.bump_epoch();
        }
        Ok(customer)
    }

    /// Change the conversation language, ending current conversations.
    pub fn set_language(&self, language: Language) {
        let changed = {
            let mut current = self.inner.language.write();
            let changed = *current != language;
            *current = language;
            changed
        };
        if changed {
            tracing::info!(language = %language, "conversation language changed");
            self.bump_epoch();
        }
    }

    /// Dispatcher sharing this context's live shop and support desk.
    #[must_use]
    pub fn dispatcher(&self) -> ToolDispatcher {
        ToolDispatcher::new(self.shop().clone(), Arc::clone(self.support()))
    }

    /// System prompt for the active customer and language.
    #[must_use]
    pub fn system_prompt(&self, channel: Channel) -> String {
        render_system_prompt(self.active_customer().as_ref(), self.language(), channel)
    }

    fn bump_epoch(&self) {
        self.inner.epoch.send_modify(|epoch| *epoch += 1);
        tracing::debug!(epoch = self.epoch(), "session epoch advanced");
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("language", &self.language())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AppContext {
        AppContext::from_config(&AgentConfig::default()).expect("context")
    }

    #[test]
    fn test_defaults_to_first_customer() {
        let ctx = context();
        assert_eq!(ctx.shop().active_customer(), CustomerId::new(1));
        assert_eq!(ctx.language(), Language::English);
        assert_eq!(ctx.epoch(), 0);
    }

    #[test]
    fn test_unknown_configured_customer() {
        let config = AgentConfig {
            customer_id: Some(CustomerId::new(50)),
            ..AgentConfig::default()
        };
        assert!(AppContext::from_config(&config).is_err());
    }

    #[test]
    fn test_switches_bump_epoch_only_on_change() {
        let ctx = context();
        ctx.switch_customer(CustomerId::new(1)).expect("same customer");
        ctx.set_language(Language::English);
        assert_eq!(ctx.epoch(), 0);

        ctx.switch_customer(CustomerId::new(2)).expect("switch");
        assert_eq!(ctx.epoch(), 1);
        ctx.set_language(Language::French);
        assert_eq!(ctx.epoch(), 2);

        assert!(ctx.switch_customer(CustomerId::new(9)).is_err());
        assert_eq!(ctx.epoch(), 2);
    }

    #[test]
    fn test_prompt_tracks_active_customer() {
        let ctx = context();
        ctx.switch_customer(CustomerId::new(2)).expect("switch");
        assert!(ctx.system_prompt(Channel::Text).contains("Jordan Lee"));
    }
}
