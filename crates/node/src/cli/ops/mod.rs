pub mod bucket;
pub mod init;
pub mod node;

pub use bucket::Bucket;
pub use init::Init;
pub use node::Node;
