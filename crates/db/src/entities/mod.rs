//! `SeaORM` entities.

pub mod attachments;
pub mod settings;
