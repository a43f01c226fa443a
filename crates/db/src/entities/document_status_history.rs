//! `SeaORM` Entity for document_status_history table.

use super::sea_orm_active_enums::{DocumentKind, DocumentStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "document_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_kind: DocumentKind,
    pub document_id: Uuid,
    pub document_number: String,
    pub from_status: DocumentStatus,
    pub to_status: DocumentStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub actor: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
