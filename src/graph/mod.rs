pub mod changes;
pub mod handles;
pub mod ids;
pub mod model;
pub mod store;
pub mod topology;

pub use changes::{EdgeChange, NodeChange};
pub use handles::{Handle, HandleSide, handle_id, slot_of};
pub use ids::IdAllocator;
pub use model::*;
pub use store::GraphStore;
pub use topology::Topology;
