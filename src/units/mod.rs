// Units: the individually loadable pieces a service type is assembled from
//
// A service type names its units in its descriptor; the loader resolves
// them through a `UnitResolver` (normally a `UnitCatalog`) and wires them
// into the type's accessor and request tables.

pub mod catalog;
#[cfg(test)]
pub mod mocks;
pub mod traits;

pub use catalog::{unit_path, UnitCatalog};
pub use traits::{ModelUnit, RequestUnit, Transport, UnitResolver};

/// Model unit with no behaviour beyond its type identifier
///
/// Enough for collections whose objects are plain attribute bags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedModel {
    type_name: String,
}

impl NamedModel {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl ModelUnit for NamedModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }
}
