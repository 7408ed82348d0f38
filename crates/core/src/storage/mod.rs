pub mod backend;
pub mod format;
pub mod local;
pub mod manager;
pub mod migration;
pub mod remote;
pub mod seed;
