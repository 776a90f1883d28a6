//! Real-time event distribution for campusdesk.
//!
//! Redis Pub/Sub fans complaint and notification events out across server
//! instances; each instance bridges its subscription into the in-process
//! SSE broadcaster.

pub mod pubsub;

pub use pubsub::{channels, PubSubEvent, PubSubSseBridge, RedisPubSub};
