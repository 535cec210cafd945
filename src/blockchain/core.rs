// core.rs splits responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod clock;
pub mod validation;

pub use chain::*;
pub use clock::*;
pub use validation::*;
