pub mod keyed_lock;
pub mod leave_type_cache;
