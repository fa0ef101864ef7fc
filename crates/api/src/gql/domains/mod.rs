// Each domain contains: mod.rs, resolvers.rs, types.rs

pub mod comments;
pub mod reservations;
pub mod restaurants;
