pub mod day;
pub mod day_locks;
pub mod memory;
pub mod rest;
pub mod state;
pub mod store;

pub use day_locks::DayLocks;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use state::AppState;
pub use store::{
    DayWindow, PatientChanges, PatientStore, StoreError, StoreResult, VisitChanges, VisitStore,
};
