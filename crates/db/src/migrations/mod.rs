//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250401_000001_create_user_table;
mod m20250401_000002_create_user_profile_table;
mod m20250401_000003_create_complaint_table;
mod m20250401_000004_create_vote_table;
mod m20250401_000005_create_notification_table;
mod m20250401_000006_create_upload_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250401_000001_create_user_table::Migration),
            Box::new(m20250401_000002_create_user_profile_table::Migration),
            Box::new(m20250401_000003_create_complaint_table::Migration),
            Box::new(m20250401_000004_create_vote_table::Migration),
            Box::new(m20250401_000005_create_notification_table::Migration),
            Box::new(m20250401_000006_create_upload_table::Migration),
        ]
    }
}
