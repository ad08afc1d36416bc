//! Route-change notification.
//!
//! Components that mirror navigation (menu highlight, tab bar) subscribe here
//! instead of watching router state, because state-derived watching lags page
//! rendering. The dispatcher is an explicit, ordered observer list — observers
//! run in registration order and there is no ambient global channel.

use crate::state::NavigationRequest;

/// An observer invoked on every committed navigation.
pub type RouteChangeListener = Box<dyn FnMut(&NavigationRequest)>;

/// Ordered list of route-change observers plus the last dispatched change.
#[derive(Default)]
pub struct RouteChangeDispatcher {
    listeners: Vec<RouteChangeListener>,
    last_change: Option<NavigationRequest>,
}

impl RouteChangeDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. If a navigation was already dispatched and
    /// `immediate` is set, the observer is invoked with it right away.
    pub fn listen<F>(&mut self, listener: F, immediate: bool)
    where
        F: FnMut(&NavigationRequest) + 'static,
    {
        let mut listener = Box::new(listener);
        if immediate {
            if let Some(last) = &self.last_change {
                listener(last);
            }
        }
        self.listeners.push(listener);
    }

    /// Dispatch a committed navigation to every observer, in order.
    pub fn dispatch(&mut self, request: &NavigationRequest) {
        for listener in &mut self.listeners {
            listener(request);
        }
        self.last_change = Some(request.clone());
    }

    /// The most recently dispatched navigation, if any.
    pub fn last_change(&self) -> Option<&NavigationRequest> {
        self.last_change.as_ref()
    }

    /// Number of registered observers.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
