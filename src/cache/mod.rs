pub mod set_size_cache;

pub use set_size_cache::SetSizeCache;
