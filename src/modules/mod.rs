pub mod feed;
pub mod locker;
pub mod store;
