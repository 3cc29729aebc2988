pub mod network;
pub mod tree;
pub mod util;
