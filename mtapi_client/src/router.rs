//! Quote stream router.
//!
//! Fans the terminal's unsolicited quote pushes out to application
//! observers. Delivery is synchronous on the calling thread, in arrival
//! order, with no batching. Updates go to a narrow `(instrument, bid, ask)`
//! observer list; additions and removals carry the full `Quote`.
use std::sync::Arc;

use log::debug;
use mtapi_common::{MtQuote, Quote};

use crate::observer::{ObserverRegistry, SubscriptionId};

/// Callback for quote additions and removals.
pub type QuoteObserver = dyn Fn(&Quote) + Send + Sync;
/// Callback for price updates: instrument, bid, ask.
pub type QuoteUpdateObserver = dyn Fn(&str, f64, f64) + Send + Sync;

/// Three independent observer lists, one per notification kind.
#[derive(Default)]
pub struct QuoteRouter {
    updated: ObserverRegistry<QuoteUpdateObserver>,
    added: ObserverRegistry<QuoteObserver>,
    removed: ObserverRegistry<QuoteObserver>,
}

impl QuoteRouter {
    /// Creates a router without observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a price-update observer.
    pub fn on_updated(
        &self,
        observer: impl Fn(&str, f64, f64) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.updated.register(Arc::new(observer))
    }

    /// Registers a quote-added observer.
    pub fn on_added(&self, observer: impl Fn(&Quote) + Send + Sync + 'static) -> SubscriptionId {
        self.added.register(Arc::new(observer))
    }

    /// Registers a quote-removed observer.
    pub fn on_removed(&self, observer: impl Fn(&Quote) + Send + Sync + 'static) -> SubscriptionId {
        self.removed.register(Arc::new(observer))
    }

    /// Removes an observer from whichever list holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.updated.unregister(id) || self.added.unregister(id) || self.removed.unregister(id)
    }

    /// Routes a quote-updated push. An absent record is ignored.
    pub fn quote_updated(&self, record: Option<MtQuote>) {
        let Some(record) = record else {
            debug!("Quote update without record ignored");
            return;
        };
        self.updated.notify("quote-updated", |observer| {
            observer(&record.instrument, record.bid, record.ask)
        });
    }

    /// Routes a quote-added push. An absent record is ignored.
    pub fn quote_added(&self, record: Option<MtQuote>) {
        let Some(record) = record else {
            debug!("Quote addition without record ignored");
            return;
        };
        let quote = Quote::from(record);
        self.added.notify("quote-added", |observer| observer(&quote));
    }

    /// Routes a quote-removed push. An absent record is ignored.
    pub fn quote_removed(&self, record: Option<MtQuote>) {
        let Some(record) = record else {
            debug!("Quote removal without record ignored");
            return;
        };
        let quote = Quote::from(record);
        self.removed.notify("quote-removed", |observer| observer(&quote));
    }
}
