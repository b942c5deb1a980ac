mod builtins;
#[allow(clippy::module_inception)]
mod executor;
mod redirect;
pub mod variable;

pub use executor::Executor;
