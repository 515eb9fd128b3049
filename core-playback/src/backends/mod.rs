//! Concrete [`SourceBackend`](crate::traits::SourceBackend) adapters.

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;
