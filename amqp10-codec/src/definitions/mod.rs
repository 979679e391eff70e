//! The composite types of AMQP 1.0 which regularly show up inside messages and link attachments.
//!
//! Each function returns a fresh definition; `Registry::standard` registers all of them. Definitions which reference
//! other composites take the registered definition as argument, so registration order matters.

mod messaging;
mod terminus;
mod transport;

pub use messaging::*;
pub use terminus::*;
pub use transport::*;

use crate::composite::Registry;
use crate::error::RegistryError;

pub(crate) fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    let error = registry.define(transport::error())?;
    registry.define(messaging::header())?;
    registry.define(messaging::properties())?;
    registry.define(messaging::accepted())?;
    registry.define(messaging::rejected(&error))?;
    registry.define(messaging::released())?;
    registry.define(messaging::modified())?;
    registry.define(terminus::source())?;
    registry.define(terminus::target())?;
    Ok(())
}
