pub mod snapshot;

pub use snapshot::ActorSnapshot;
