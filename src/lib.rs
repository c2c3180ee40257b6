// Library interface for servicekit
//
// Declare service types once (keys, collections, models, requests), then
// build wired client instances against either a real or a simulated backend.

pub mod backend;
pub mod error;
pub mod logging;
pub mod registry;
pub mod service;
pub mod settings;
pub mod units;

// Re-export commonly used types for convenience
pub use backend::{Backend, HttpTransport, MockStore, Variant};
pub use error::{BuildError, LoadError, ServiceError, SettingsError, UnitKind, ValidationError};
pub use registry::{
    config_from, unit_type_name, validate_arguments, Attributes, Config, Descriptor, DescriptorBuilder,
    Registry, ServiceType, Symbol, Wiring,
};
pub use service::{Collection, Connection, Service, CONNECTION_KEY};
pub use settings::{BuildContext, Credentials, Mode};
pub use units::{ModelUnit, NamedModel, RequestUnit, Transport, UnitCatalog, UnitResolver};
