// Application layer - Use case interactors

pub mod container;
pub mod inspect_interactor;
pub mod slice_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::InspectInteractor;
pub use slice_interactor::{JobHandle, SliceInteractor};
