//! `SeaORM` Entity for supplier_invoice_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_invoice_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier_invoice_id: Uuid,
    pub line_number: i32,
    pub account_id: Uuid,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub line_total: Decimal,
    pub cost_center_id: Option<Uuid>,
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
