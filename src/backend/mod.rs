// Backends for the two service variants
//
// Real instances talk through a `Transport` built from their config; Mock
// instances share their service type's `MockStore`.

pub mod http;
pub mod mock_store;

pub use http::HttpTransport;
pub use mock_store::MockStore;

use crate::error::BuildError;
use crate::registry::symbol::Config;
use crate::units::Transport;
use std::fmt;
use std::sync::Arc;

/// Which implementation a service instance was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Real,
    Mock,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Real => f.write_str("real"),
            Variant::Mock => f.write_str("mock"),
        }
    }
}

/// Constructor for a Real instance's transport, given the merged config
pub type TransportFactory = Arc<dyn Fn(&Config) -> Result<Arc<dyn Transport>, BuildError> + Send + Sync>;

/// Factory used when a service type does not register its own
pub fn default_transport_factory() -> TransportFactory {
    Arc::new(|config: &Config| -> Result<Arc<dyn Transport>, BuildError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Arc::new(transport) as Arc<dyn Transport>)
    })
}

/// The backend attached to one service instance
#[derive(Clone)]
pub enum Backend {
    Real(Arc<dyn Transport>),
    Mock(Arc<MockStore>),
}

impl Backend {
    pub fn variant(&self) -> Variant {
        match self {
            Backend::Real(_) => Variant::Real,
            Backend::Mock(_) => Variant::Mock,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Backend::{}", self.variant())
    }
}
