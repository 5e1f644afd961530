pub mod diff;
pub mod dispatch;
pub mod export;
pub mod history;
pub mod hydrate;
pub mod record;
pub mod shared;
pub mod types;
