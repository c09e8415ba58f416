#![forbid(unsafe_code)]

pub mod firestore;
pub mod repository;
pub mod sqlite;

pub use repository::{
    ExerciseKind, ExerciseResult, InMemoryStore, MedalRecord, MedalStats, MedalRepository,
    ProgressRepository, RemoteStore, StoreError,
};
