mod rtree;

pub use rtree::SegRTree;
