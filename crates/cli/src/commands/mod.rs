pub mod migrate;
pub mod shops;
