//! Connection handles to the remote endpoints.
//!
//! A [`ConnectionHandle`] starts out empty. `bind` asks a [`Binder`] to
//! connect the endpoint; the binder answers later through the
//! [`ConnectionLink`] it was given, so the live interface may still be
//! missing right after `bind` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::remote::EndpointRole;

/// Resolves a role to a concrete endpoint and connects it.
pub trait Binder<I: ?Sized>: Send + Sync {
    /// Start connecting the endpoint for `role`. The binder reports the
    /// outcome through `link`, possibly from another task.
    fn bind(&self, role: EndpointRole, link: ConnectionLink<I>);

    fn unbind(&self, role: EndpointRole);
}

struct Shared<I: ?Sized> {
    iface: watch::Sender<Option<Arc<I>>>,
    /// Bumped by every unbind so links from an earlier bind go stale.
    epoch: AtomicU64,
}

/// Write side of a handle, given to the binder on `bind`.
pub struct ConnectionLink<I: ?Sized> {
    role: EndpointRole,
    epoch: u64,
    shared: Arc<Shared<I>>,
}

impl<I: ?Sized> Clone for ConnectionLink<I> {
    fn clone(&self) -> Self {
        Self {
            role: self.role,
            epoch: self.epoch,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I: ?Sized> ConnectionLink<I> {
    pub fn role(&self) -> EndpointRole {
        self.role
    }

    /// The endpoint is up; publish its interface.
    pub fn connected(&self, iface: Arc<I>) {
        let published = self.shared.iface.send_if_modified(|slot| {
            if self.is_stale() {
                return false;
            }
            *slot = Some(iface);
            true
        });

        if published {
            info!(role = %self.role, "endpoint connected");
        } else {
            debug!(role = %self.role, "ignoring connection for a binding that was released");
        }
    }

    /// The endpoint went away without an unbind.
    pub fn disconnected(&self) {
        let cleared = self.shared.iface.send_if_modified(|slot| {
            if self.is_stale() {
                return false;
            }
            slot.take().is_some()
        });

        if cleared {
            warn!(role = %self.role, "endpoint disconnected");
        }
    }

    fn is_stale(&self) -> bool {
        self.shared.epoch.load(Ordering::SeqCst) != self.epoch
    }
}

/// Possibly-absent live interface to one remote endpoint.
pub struct ConnectionHandle<I: ?Sized> {
    role: EndpointRole,
    binder: Arc<dyn Binder<I>>,
    bound: AtomicBool,
    shared: Arc<Shared<I>>,
}

impl<I: ?Sized> ConnectionHandle<I> {
    pub fn new(role: EndpointRole, binder: Arc<dyn Binder<I>>) -> Self {
        Self {
            role,
            binder,
            bound: AtomicBool::new(false),
            shared: Arc::new(Shared {
                iface: watch::Sender::new(None),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    /// Ask the binder to connect. No-op while already bound.
    pub fn bind(&self) {
        if self.bound.swap(true, Ordering::SeqCst) {
            debug!(role = %self.role, "already bound");
            return;
        }

        debug!(role = %self.role, "binding");
        let link = ConnectionLink {
            role: self.role,
            epoch: self.shared.epoch.load(Ordering::SeqCst),
            shared: Arc::clone(&self.shared),
        };
        self.binder.bind(self.role, link);
    }

    /// Release the binding and drop the interface. No-op while unbound.
    pub fn unbind(&self) {
        if !self.bound.swap(false, Ordering::SeqCst) {
            debug!(role = %self.role, "not bound");
            return;
        }

        debug!(role = %self.role, "unbinding");
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.iface.send_replace(None);
        self.binder.unbind(self.role);
    }

    pub fn current(&self) -> Option<Arc<I>> {
        self.shared.iface.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.iface.borrow().is_some()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Wait until an interface is published.
    pub async fn wait_connected(&self) -> Arc<I> {
        let mut rx = self.shared.iface.subscribe();
        loop {
            if let Some(iface) = rx.borrow_and_update().clone() {
                return iface;
            }
            // The sender lives in `self.shared`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Role-independent view of a handle, so owners can bind and unbind a
/// set of handles uniformly.
pub trait Lifecycle: Send + Sync {
    fn role(&self) -> EndpointRole;
    fn bind(&self);
    fn unbind(&self);
    fn is_connected(&self) -> bool;
}

impl<I: ?Sized + Send + Sync> Lifecycle for ConnectionHandle<I> {
    fn role(&self) -> EndpointRole {
        ConnectionHandle::role(self)
    }

    fn bind(&self) {
        ConnectionHandle::bind(self)
    }

    fn unbind(&self) {
        ConnectionHandle::unbind(self)
    }

    fn is_connected(&self) -> bool {
        ConnectionHandle::is_connected(self)
    }
}
