//! `SeaORM` Entity for supplier_invoices table.

use super::sea_orm_active_enums::DocumentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub invoice_number: String,
    pub invoice_date: Date,
    pub due_date: Option<Date>,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 10)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tax_amount: Decimal,
    pub tax_recoverable: bool,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub discount_amount: Decimal,
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
    #[sea_orm(has_many = "super::supplier_invoice_lines::Entity")]
    SupplierInvoiceLines,
    #[sea_orm(has_many = "super::payment_voucher_allocations::Entity")]
    PaymentVoucherAllocations,
}

impl Related<super::supplier_invoice_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierInvoiceLines.def()
    }
}

impl Related<super::payment_voucher_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentVoucherAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
