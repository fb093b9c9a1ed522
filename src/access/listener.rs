// SPDX-License-Identifier: Apache-2.0

//! The caller's connection-state notification slot.

use std::fmt;

type Callback = Box<dyn FnMut() + Send>;

/// Holds one notification target and remembers the last aggregate
/// connection state it reported, so each transition fires once.
pub(crate) struct Listener {
    callback: Option<Callback>,
    reported_connected: bool,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("armed", &self.callback.is_some())
            .field("reported_connected", &self.reported_connected)
            .finish()
    }
}

impl Listener {
    pub fn new(callback: Option<Callback>) -> Self {
        Self {
            callback,
            reported_connected: false,
        }
    }

    pub fn replace(&mut self, callback: Option<Callback>) -> Option<Callback> {
        std::mem::replace(&mut self.callback, callback)
    }

    /// Compares the aggregate state with what was last reported and fires
    /// on a change.
    pub fn observe(&mut self, connected: bool) {
        if connected != self.reported_connected {
            self.reported_connected = connected;
            tracing::info!(connected, "security access state changed");
            self.fire();
        }
    }

    /// Reports an explicit teardown. Fires if the last report was
    /// "connected" or an attempt was still pending; otherwise the
    /// disconnect has already been reported.
    pub fn torn_down(&mut self, pending: bool) {
        let was_connected = std::mem::take(&mut self.reported_connected);
        if pending || was_connected {
            tracing::info!("security access disconnected");
            self.fire();
        }
    }

    fn fire(&mut self) {
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }
}
