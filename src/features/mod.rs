mod bid;
mod loader;
mod shell;
mod tree;

pub use self::{
    shell::{Config, Shell, DEFAULT_BID_KEY, DEFAULT_CSV_PATH},
    tree::BinarySearchTree,
};
