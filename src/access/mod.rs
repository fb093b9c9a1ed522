// SPDX-License-Identifier: Apache-2.0

//! # Security Access
//!
//! [`SecurityAccess`] binds to whichever vendor security services are
//! installed, tracks their connection state and routes challenge signing
//! and certificate export to a connected one.
//!
//! Bind completions arrive on a queue owned by the access object. They are
//! applied whenever the owner calls [`SecurityAccess::process_events`] or
//! one of the waiting helpers, so all state changes happen on the owner's
//! thread.
//!
//! ```ignore
//! let mut access = SecurityAccess::with_listener(binder, || println!("state changed"));
//! access.connect();
//! if access.wait_until_connected(Duration::from_secs(5)) {
//!     let response = access.sign_challenge("BMWConnected", &challenge)?;
//!     let bundle = access.fetch_bmw_certs()?;
//! }
//! access.disconnect();
//! ```

mod client;
mod listener;
mod multiplexer;
mod types;

pub use types::*;

use listener::Listener;
use multiplexer::Multiplexer;

use crate::{
    error::{Error, Result},
    services::{self, ServiceDescriptor},
    transport::Binder,
};

use std::time::{Duration, Instant};

/// A handle to the vehicle security services reachable through `B`.
#[derive(Debug)]
pub struct SecurityAccess<B: Binder> {
    binder: B,
    services: &'static [ServiceDescriptor],
    mux: Multiplexer<B::Handle>,
    listener: Listener,
}

impl<B: Binder> SecurityAccess<B> {
    /// Creates an access object over every known security service.
    pub fn new(binder: B) -> Self {
        Self::with_services(binder, services::list_known_services())
    }

    /// Creates an access object whose listener fires on connection state
    /// changes.
    pub fn with_listener<F>(binder: B, listener: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let mut access = Self::new(binder);
        access.set_listener(listener);
        access
    }

    /// Creates an access object restricted to `services`.
    pub fn with_services(binder: B, services: &'static [ServiceDescriptor]) -> Self {
        Self {
            binder,
            services,
            mux: Multiplexer::new(),
            listener: Listener::new(None),
        }
    }

    /// Installs the notification target, replacing any previous one.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.listener.replace(Some(Box::new(listener)));
    }

    /// Removes the notification target.
    pub fn clear_listener(&mut self) {
        self.listener.replace(None);
    }

    /// The underlying binder.
    pub fn binder(&self) -> &B {
        &self.binder
    }

    /// Requests a bind to every installed known service.
    pub fn connect(&mut self) {
        self.mux.connect(&mut self.binder, self.services);
        self.process_events();
    }

    /// Unbinds everything and clears all attempts. The listener fires once
    /// if the session was reported connected or an attempt was still
    /// pending; a session already reported disconnected stays silent.
    pub fn disconnect(&mut self) {
        let pending = self.mux.disconnect(&mut self.binder);
        self.listener.torn_down(pending);
    }

    /// Applies queued bind completions without blocking.
    pub fn process_events(&mut self) -> usize {
        let applied = self.mux.process_events(&mut self.binder);
        self.listener.observe(self.mux.is_connected());
        applied
    }

    /// Waits up to `timeout` for a bind completion, then applies whatever
    /// is queued.
    pub fn wait_for_events(&mut self, timeout: Duration) -> usize {
        let applied = self.mux.wait_for_events(&mut self.binder, timeout);
        self.listener.observe(self.mux.is_connected());
        applied
    }

    /// Processes completions until a service is connected, nothing is
    /// pending any more, or `timeout` passes. Returns
    /// [`is_connected`](Self::is_connected).
    pub fn wait_until_connected(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_events();

        while !self.is_connected() && self.is_connecting() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.wait_for_events(deadline - now);
        }

        self.is_connected()
    }

    /// Processes completions until no attempt is pending or `timeout`
    /// passes. Returns whether everything settled.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_events();

        while self.is_connecting() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_events(deadline - now);
        }

        true
    }

    /// Whether any attempt is still waiting for its outcome.
    pub fn is_connecting(&self) -> bool {
        self.mux.is_connecting()
    }

    /// Whether any attempt is connected.
    pub fn is_connected(&self) -> bool {
        self.mux.is_connected()
    }

    /// All attempts of the current cycle, in registry order.
    pub fn attempts(&self) -> &[ConnectionAttempt<B::Handle>] {
        self.mux.attempts()
    }

    /// The services currently connected, in registry order.
    pub fn connected_services(&self) -> Vec<&'static ServiceDescriptor> {
        self.connected().map(|(service, _)| service).collect()
    }

    fn connected(&self) -> impl Iterator<Item = (&'static ServiceDescriptor, &B::Handle)> {
        self.mux.attempts().iter().filter_map(|a| match a.state {
            AttemptState::Connected => a.handle.as_ref().map(|h| (a.service, h)),
            _ => None,
        })
    }

    /// Resolves a variant or class name to a connected handle. A class name
    /// may match several registry entries; the first connected one in
    /// registry order is used.
    fn connected_handle(&self, name: &str) -> Result<&B::Handle> {
        if !self.services.iter().any(|s| s.matches(name)) {
            return Err(Error::UnknownService(name.to_string()));
        }

        self.connected()
            .find(|(s, _)| s.matches(name))
            .map(|(_, handle)| handle)
            .ok_or_else(|| Error::NotConnected(Some(name.to_string())))
    }
}

impl<B: Binder> Drop for SecurityAccess<B> {
    fn drop(&mut self) {
        self.mux.disconnect(&mut self.binder);
    }
}
