pub mod factory;
pub mod in_memory;
pub mod redis;

pub use factory::BroadcasterFactory;
pub use in_memory::InMemoryBroadcaster;
pub use self::redis::RedisBroadcaster;
