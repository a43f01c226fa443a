//! `SeaORM` Entity for payment_voucher_allocations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_voucher_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payment_voucher_id: Uuid,
    pub supplier_invoice_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_vouchers::Entity",
        from = "Column::PaymentVoucherId",
        to = "super::payment_vouchers::Column::Id"
    )]
    PaymentVouchers,
    #[sea_orm(
        belongs_to = "super::supplier_invoices::Entity",
        from = "Column::SupplierInvoiceId",
        to = "super::supplier_invoices::Column::Id"
    )]
    SupplierInvoices,
}

impl Related<super::payment_vouchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentVouchers.def()
    }
}

impl Related<super::supplier_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
