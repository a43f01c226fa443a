//! `SeaORM` Entity for debit_notes table.

use super::sea_orm_active_enums::DocumentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "debit_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_invoice_id: Option<Uuid>,
    pub note_number: String,
    pub note_date: Date,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 10)))")]
    pub exchange_rate: Decimal,
    pub reason: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub paid_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub outstanding_amount: Decimal,
    pub status: DocumentStatus,
    pub journal_entry_id: Option<Uuid>,
    pub is_posted_to_gl: bool,
    pub posted_to_gl_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier_invoices::Entity",
        from = "Column::SupplierInvoiceId",
        to = "super::supplier_invoices::Column::Id"
    )]
    SupplierInvoices,
}

impl Related<super::supplier_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
