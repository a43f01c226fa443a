//! Initial database migration.
//!
//! Creates the enums, fiscal calendar, source document, journal, allocation,
//! payable ledger, and status history tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: FISCAL CALENDAR & RATES
        // ============================================================
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_LINES_SQL).await?;

        // ============================================================
        // PART 4: SOURCE DOCUMENTS
        // ============================================================
        db.execute_unprepared(SUPPLIER_INVOICES_SQL).await?;
        db.execute_unprepared(DEBIT_NOTES_SQL).await?;
        db.execute_unprepared(PAYMENT_VOUCHERS_SQL).await?;
        db.execute_unprepared(SALES_INVOICES_SQL).await?;

        // ============================================================
        // PART 5: ALLOCATIONS, PAYABLE LEDGER, HISTORY
        // ============================================================
        db.execute_unprepared(PAYMENT_VOUCHER_ALLOCATIONS_SQL).await?;
        db.execute_unprepared(PAYABLE_LEDGER_SQL).await?;
        db.execute_unprepared(DOCUMENT_STATUS_HISTORY_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE period_status AS ENUM ('open', 'closed');

CREATE TYPE document_status AS ENUM (
    'draft',
    'submitted',
    'approved',
    'partially_paid',
    'paid',
    'cancelled',
    'voided'
);

CREATE TYPE document_kind AS ENUM (
    'supplier_invoice',
    'debit_note',
    'payment_voucher',
    'sales_invoice'
);

CREATE TYPE journal_status AS ENUM ('draft', 'submitted', 'posted', 'cancelled');

CREATE TYPE journal_entry_type AS ENUM (
    'manual',
    'automatic',
    'opening',
    'closing',
    'adjusting',
    'reversing',
    'reclassification',
    'intercompany'
);

CREATE TYPE journal_reference_type AS ENUM (
    'supplier_invoice',
    'debit_note',
    'payment_voucher',
    'sales_invoice',
    'journal_entry'
);

CREATE TYPE payable_transaction_type AS ENUM ('invoice', 'debit_note', 'payment', 'adjustment');
";

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    name VARCHAR(50) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_fiscal_year_dates CHECK (end_date >= start_date),
    UNIQUE (company_id, name),
    UNIQUE (company_id, start_date)
);

CREATE INDEX idx_fiscal_years_company ON fiscal_years(company_id, start_date);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    period_number INTEGER NOT NULL,
    name VARCHAR(50) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status period_status NOT NULL DEFAULT 'open',
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_period_number CHECK (period_number > 0),
    UNIQUE (fiscal_year_id, period_number),
    UNIQUE (company_id, start_date)
);

CREATE INDEX idx_accounting_periods_company_date ON accounting_periods(company_id, start_date, end_date);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    from_currency CHAR(3) NOT NULL,
    to_currency CHAR(3) NOT NULL,
    rate NUMERIC(19, 10) NOT NULL,
    effective_date DATE NOT NULL,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rate_positive CHECK (rate > 0),
    CONSTRAINT chk_different_currencies CHECK (from_currency <> to_currency),
    CONSTRAINT chk_from_currency CHECK (from_currency ~ '^[A-Z]{3}$'),
    CONSTRAINT chk_to_currency CHECK (to_currency ~ '^[A-Z]{3}$'),
    UNIQUE (company_id, from_currency, to_currency, effective_date)
);

CREATE INDEX idx_exchange_rates_lookup ON exchange_rates(company_id, from_currency, to_currency, effective_date DESC);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    entry_number VARCHAR(50) NOT NULL,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id),
    accounting_period_id UUID NOT NULL REFERENCES accounting_periods(id),
    entry_type journal_entry_type NOT NULL,
    entry_date DATE NOT NULL,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    description TEXT NOT NULL,
    reference_type journal_reference_type NOT NULL,
    reference_id UUID NOT NULL,
    reference_number VARCHAR(100) NOT NULL,
    total_debit NUMERIC(19, 4) NOT NULL,
    total_credit NUMERIC(19, 4) NOT NULL,
    status journal_status NOT NULL DEFAULT 'draft',
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    reversal_of UUID REFERENCES journal_entries(id),
    reversal_entry_id UUID REFERENCES journal_entries(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_posted_balanced CHECK (status <> 'posted' OR total_debit = total_credit),
    CONSTRAINT chk_rate_positive CHECK (exchange_rate > 0),
    UNIQUE (company_id, entry_number)
);

-- Second line of defence against double posting
CREATE UNIQUE INDEX uq_journal_entries_source
    ON journal_entries(reference_type, reference_id)
    WHERE entry_type <> 'reversing' AND status = 'posted';

CREATE UNIQUE INDEX uq_journal_entries_reversal_of
    ON journal_entries(reversal_of)
    WHERE reversal_of IS NOT NULL;

CREATE INDEX idx_journal_entries_period ON journal_entries(company_id, accounting_period_id);

-- Last journal entry number handed out per company
CREATE TABLE journal_entry_sequences (
    company_id UUID PRIMARY KEY,
    last_number BIGINT NOT NULL CHECK (last_number > 0)
);
";

const JOURNAL_ENTRY_LINES_SQL: &str = r"
CREATE TABLE journal_entry_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    base_debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    base_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    description TEXT,
    cost_center_id UUID,
    CONSTRAINT chk_line_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT chk_line_one_side CHECK (debit = 0 OR credit = 0),
    UNIQUE (journal_entry_id, line_number)
);

CREATE INDEX idx_journal_entry_lines_account ON journal_entry_lines(account_id);
";

const SUPPLIER_INVOICES_SQL: &str = r"
CREATE TABLE supplier_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    supplier_id UUID NOT NULL,
    invoice_number VARCHAR(100) NOT NULL,
    invoice_date DATE NOT NULL,
    due_date DATE,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    subtotal NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_recoverable BOOLEAN NOT NULL DEFAULT false,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    outstanding_amount NUMERIC(19, 4) NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    journal_entry_id UUID REFERENCES journal_entries(id),
    is_posted_to_gl BOOLEAN NOT NULL DEFAULT false,
    posted_to_gl_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_supplier_invoice_paid CHECK (paid_amount >= 0),
    UNIQUE (company_id, supplier_id, invoice_number)
);

CREATE INDEX idx_supplier_invoices_open
    ON supplier_invoices(company_id, supplier_id, invoice_date, invoice_number)
    WHERE status IN ('approved', 'partially_paid');

CREATE TABLE supplier_invoice_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    supplier_invoice_id UUID NOT NULL REFERENCES supplier_invoices(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    quantity NUMERIC(19, 4) NOT NULL DEFAULT 1,
    unit_price NUMERIC(19, 4) NOT NULL,
    line_total NUMERIC(19, 4) NOT NULL,
    cost_center_id UUID,
    UNIQUE (supplier_invoice_id, line_number)
);
";

const DEBIT_NOTES_SQL: &str = r"
CREATE TABLE debit_notes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    supplier_id UUID NOT NULL,
    supplier_invoice_id UUID REFERENCES supplier_invoices(id),
    note_number VARCHAR(100) NOT NULL,
    note_date DATE NOT NULL,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    reason TEXT,
    total_amount NUMERIC(19, 4) NOT NULL,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    outstanding_amount NUMERIC(19, 4) NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    journal_entry_id UUID REFERENCES journal_entries(id),
    is_posted_to_gl BOOLEAN NOT NULL DEFAULT false,
    posted_to_gl_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_debit_note_amount CHECK (total_amount > 0),
    UNIQUE (company_id, note_number)
);
";

const PAYMENT_VOUCHERS_SQL: &str = r"
CREATE TABLE payment_vouchers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    supplier_id UUID NOT NULL,
    voucher_number VARCHAR(100) NOT NULL,
    payment_date DATE NOT NULL,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    amount NUMERIC(19, 4) NOT NULL,
    base_amount NUMERIC(19, 4) NOT NULL,
    allocated_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    unallocated_amount NUMERIC(19, 4) NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    is_on_hold BOOLEAN NOT NULL DEFAULT false,
    hold_reason TEXT,
    held_by UUID,
    held_at TIMESTAMPTZ,
    journal_entry_id UUID REFERENCES journal_entries(id),
    is_posted_to_gl BOOLEAN NOT NULL DEFAULT false,
    posted_to_gl_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_voucher_amount CHECK (amount > 0),
    CONSTRAINT chk_voucher_unallocated CHECK (unallocated_amount >= 0),
    CONSTRAINT chk_voucher_allocation_sum CHECK (allocated_amount + unallocated_amount = amount),
    CONSTRAINT chk_hold_reason CHECK (NOT is_on_hold OR hold_reason IS NOT NULL),
    UNIQUE (company_id, voucher_number)
);
";

const SALES_INVOICES_SQL: &str = r"
CREATE TABLE sales_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    customer_id UUID NOT NULL,
    invoice_number VARCHAR(100) NOT NULL,
    invoice_date DATE NOT NULL,
    due_date DATE,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    subtotal NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    outstanding_amount NUMERIC(19, 4) NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    journal_entry_id UUID REFERENCES journal_entries(id),
    is_posted_to_gl BOOLEAN NOT NULL DEFAULT false,
    posted_to_gl_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (company_id, invoice_number)
);

CREATE TABLE sales_invoice_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sales_invoice_id UUID NOT NULL REFERENCES sales_invoices(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    quantity NUMERIC(19, 4) NOT NULL DEFAULT 1,
    unit_price NUMERIC(19, 4) NOT NULL,
    line_total NUMERIC(19, 4) NOT NULL,
    cost_center_id UUID,
    UNIQUE (sales_invoice_id, line_number)
);
";

const PAYMENT_VOUCHER_ALLOCATIONS_SQL: &str = r"
CREATE TABLE payment_voucher_allocations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_voucher_id UUID NOT NULL REFERENCES payment_vouchers(id),
    supplier_invoice_id UUID NOT NULL REFERENCES supplier_invoices(id),
    amount NUMERIC(19, 4) NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allocation_positive CHECK (amount > 0)
);

CREATE INDEX idx_allocations_voucher ON payment_voucher_allocations(payment_voucher_id);
CREATE INDEX idx_allocations_invoice ON payment_voucher_allocations(supplier_invoice_id);
";

const PAYABLE_LEDGER_SQL: &str = r"
CREATE TABLE payable_ledger (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    supplier_id UUID NOT NULL,
    transaction_date DATE NOT NULL,
    transaction_type payable_transaction_type NOT NULL,
    reference_kind document_kind,
    reference_id UUID,
    reference_number VARCHAR(100),
    currency CHAR(3) NOT NULL,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    exchange_rate NUMERIC(19, 10) NOT NULL DEFAULT 1,
    rate_effective_date DATE NOT NULL,
    base_debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    base_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance_foreign NUMERIC(19, 4) NOT NULL,
    balance_base NUMERIC(19, 4) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payable_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT chk_payable_non_zero CHECK (debit > 0 OR credit > 0)
);

CREATE INDEX idx_payable_ledger_supplier
    ON payable_ledger(company_id, supplier_id, transaction_date);
";

const DOCUMENT_STATUS_HISTORY_SQL: &str = r"
CREATE TABLE document_status_history (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_kind document_kind NOT NULL,
    document_id UUID NOT NULL,
    document_number VARCHAR(100) NOT NULL,
    from_status document_status NOT NULL,
    to_status document_status NOT NULL,
    note TEXT,
    actor UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_status_history_document
    ON document_status_history(document_kind, document_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- Posted journal entries and their lines are immutable, except for
-- linking a reversal.
CREATE OR REPLACE FUNCTION prevent_posted_journal_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status = 'posted' THEN
        IF NEW.reversal_entry_id IS DISTINCT FROM OLD.reversal_entry_id
           AND OLD.reversal_entry_id IS NULL
           AND (NEW.total_debit, NEW.total_credit, NEW.status, NEW.entry_date)
               = (OLD.total_debit, OLD.total_credit, OLD.status, OLD.entry_date) THEN
            RETURN NEW;
        END IF;
        RAISE EXCEPTION 'Posted journal entry % cannot be modified', OLD.entry_number;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_posted_journal_modification
    BEFORE UPDATE ON journal_entries
    FOR EACH ROW EXECUTE FUNCTION prevent_posted_journal_modification();

-- The payable ledger is append-only. Running balances of later rows move
-- when an earlier-dated row is inserted; nothing else may change.
CREATE OR REPLACE FUNCTION prevent_payable_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'UPDATE'
       AND (to_jsonb(NEW) - 'balance_base' - 'balance_foreign')
           = (to_jsonb(OLD) - 'balance_base' - 'balance_foreign') THEN
        RETURN NEW;
    END IF;
    RAISE EXCEPTION 'payable_ledger rows are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_payable_ledger_modification
    BEFORE UPDATE OR DELETE ON payable_ledger
    FOR EACH ROW EXECUTE FUNCTION prevent_payable_ledger_modification();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS document_status_history CASCADE;
DROP TABLE IF EXISTS payable_ledger CASCADE;
DROP TABLE IF EXISTS payment_voucher_allocations CASCADE;
DROP TABLE IF EXISTS sales_invoice_lines CASCADE;
DROP TABLE IF EXISTS sales_invoices CASCADE;
DROP TABLE IF EXISTS payment_vouchers CASCADE;
DROP TABLE IF EXISTS debit_notes CASCADE;
DROP TABLE IF EXISTS supplier_invoice_lines CASCADE;
DROP TABLE IF EXISTS supplier_invoices CASCADE;
DROP TABLE IF EXISTS journal_entry_sequences CASCADE;
DROP TABLE IF EXISTS journal_entry_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;

DROP FUNCTION IF EXISTS prevent_posted_journal_modification() CASCADE;
DROP FUNCTION IF EXISTS prevent_payable_ledger_modification() CASCADE;

DROP TYPE IF EXISTS payable_transaction_type;
DROP TYPE IF EXISTS journal_reference_type;
DROP TYPE IF EXISTS journal_entry_type;
DROP TYPE IF EXISTS journal_status;
DROP TYPE IF EXISTS document_kind;
DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS period_status;
";
