use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tracing::debug;

use crate::connection::{Binder, ConnectionLink};
use crate::remote::EndpointRole;

/// Binder that hosts an endpoint in the current process.
///
/// The connection completes on a spawned task, after `bind` has
/// returned, the same way an out-of-process binding would.
pub struct LocalBinder<I: ?Sized> {
    endpoint: Arc<I>,
    links: Mutex<HashMap<EndpointRole, ConnectionLink<I>>>,
}

impl<I: ?Sized + Send + Sync + 'static> LocalBinder<I> {
    pub fn new(endpoint: Arc<I>) -> Self {
        Self {
            endpoint,
            links: Mutex::new(HashMap::new()),
        }
    }

    /// Simulate the endpoint going away on its own.
    pub fn disconnect(&self, role: EndpointRole) {
        let link = self
            .links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .cloned();
        if let Some(link) = link {
            link.disconnected();
        }
    }
}

impl<I: ?Sized + Send + Sync + 'static> Binder<I> for LocalBinder<I> {
    fn bind(&self, role: EndpointRole, link: ConnectionLink<I>) {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(role, link.clone());

        let endpoint = Arc::clone(&self.endpoint);
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    link.connected(endpoint);
                });
            }
            Err(_) => {
                debug!(%role, "no runtime, connecting in place");
                link.connected(endpoint);
            }
        }
    }

    fn unbind(&self, role: EndpointRole) {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&role);
    }
}
