pub mod accrual;
pub mod geo;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::Layer;
pub use state::{load_account, load_user, Memory, State, Status};
