//! `SeaORM` Entity for payment_vouchers table.

use super::sea_orm_active_enums::DocumentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub voucher_number: String,
    pub payment_date: Date,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 10)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub base_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub allocated_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unallocated_amount: Decimal,
    pub status: DocumentStatus,
    pub is_on_hold: bool,
    pub hold_reason: Option<String>,
    pub held_by: Option<Uuid>,
    pub held_at: Option<DateTimeWithTimeZone>,
    pub journal_entry_id: Option<Uuid>,
    pub is_posted_to_gl: bool,
    pub posted_to_gl_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_voucher_allocations::Entity")]
    PaymentVoucherAllocations,
}

impl Related<super::payment_voucher_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentVoucherAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
