//! Intent processors.

pub mod parrot;

pub use self::parrot::{ParrotIntent, ParrotIntentProcessor, ParrotSpec};
