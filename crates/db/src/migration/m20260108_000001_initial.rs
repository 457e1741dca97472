//! Initial database migration.
//!
//! Creates the enums, the profile, establishment, application, document and
//! checklist tables, and the triggers that guard them.

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
        // PART 2: ACCOUNTS
        // ============================================================
        db.execute_unprepared(PROFILES_SQL).await?;

        // ============================================================
        // PART 3: ESTABLISHMENTS
        // ============================================================
        db.execute_unprepared(ESTABLISHMENTS_SQL).await?;

        // ============================================================
        // PART 4: APPLICATIONS & DOCUMENTS
        // ============================================================
        db.execute_unprepared(APPLICATIONS_SQL).await?;
        db.execute_unprepared(APPLICATION_DOCUMENTS_SQL).await?;

        // ============================================================
        // PART 5: INSPECTIONS
        // ============================================================
        db.execute_unprepared(INSPECTION_CHECKLISTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
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
-- Fixed at account creation
CREATE TYPE user_role AS ENUM ('admin', 'inspector', 'owner');

-- Establishment registration
CREATE TYPE establishment_status AS ENUM (
    'unregistered',
    'pending',
    'registered',
    'rejected'
);

CREATE TYPE certificate_type AS ENUM (
    'fsec',
    'fsic_occupancy',
    'fsic_business'
);

-- FSEC only ever uses pending, approved and rejected
CREATE TYPE application_status AS ENUM (
    'pending',
    'for_inspection',
    'inspected',
    'approved',
    'rejected'
);
";

const PROFILES_SQL: &str = r"
CREATE TABLE profiles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    middle_name VARCHAR(100),
    last_name VARCHAR(100) NOT NULL,
    role user_role NOT NULL,
    position VARCHAR(50),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_profiles_email UNIQUE (email)
);

CREATE INDEX idx_profiles_role ON profiles(role) WHERE is_active;
";

const ESTABLISHMENTS_SQL: &str = r"
CREATE TABLE establishments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL REFERENCES profiles(id),
    name VARCHAR(255) NOT NULL,
    dti_cert_no VARCHAR(64) NOT NULL,
    address TEXT,
    status establishment_status NOT NULL DEFAULT 'unregistered',
    rejection_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_establishments_dti UNIQUE (dti_cert_no),
    CONSTRAINT chk_unregistered_has_no_address
        CHECK (status <> 'unregistered' OR address IS NULL)
);

CREATE INDEX idx_establishments_owner ON establishments(owner_id, created_at DESC);
CREATE INDEX idx_establishments_status ON establishments(status, created_at DESC);
";

const APPLICATIONS_SQL: &str = r"
CREATE TABLE applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    establishment_id UUID NOT NULL REFERENCES establishments(id),
    certificate_type certificate_type NOT NULL,
    status application_status NOT NULL DEFAULT 'pending',
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    inspector_id UUID REFERENCES profiles(id),
    inspection_date DATE,
    inspection_time TIME,
    priority BOOLEAN NOT NULL DEFAULT false,
    rejection_reason TEXT,
    certificate_url TEXT,
    remarks TEXT,
    submitted_by UUID NOT NULL REFERENCES profiles(id),
    decided_by UUID REFERENCES profiles(id),
    decided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_fsec_skips_inspection CHECK (
        certificate_type <> 'fsec'
        OR (status IN ('pending', 'approved', 'rejected') AND inspector_id IS NULL)
    ),
    CONSTRAINT chk_rejection_has_reason CHECK (
        status <> 'rejected' OR rejection_reason IS NOT NULL
    )
);

CREATE INDEX idx_applications_establishment ON applications(establishment_id, applied_at DESC);
CREATE INDEX idx_applications_type_status ON applications(certificate_type, status);

-- Inspector worklist
CREATE INDEX idx_applications_inspector ON applications(inspector_id, inspection_date)
    WHERE inspector_id IS NOT NULL;
";

const APPLICATION_DOCUMENTS_SQL: &str = r"
CREATE TABLE application_documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    application_id UUID NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    document_type VARCHAR(100) NOT NULL,
    file_name VARCHAR(255) NOT NULL,
    file_size BIGINT NOT NULL CHECK (file_size > 0),
    mime_type VARCHAR(100) NOT NULL,
    storage_provider VARCHAR(20) NOT NULL,
    storage_bucket VARCHAR(255) NOT NULL,
    storage_key VARCHAR(500) NOT NULL,
    uploaded_by UUID NOT NULL REFERENCES profiles(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_application_documents_application
    ON application_documents(application_id, created_at);
";

const INSPECTION_CHECKLISTS_SQL: &str = r"
CREATE TABLE inspection_checklists (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    application_id UUID NOT NULL REFERENCES applications(id),
    certificate_type certificate_type NOT NULL,
    inspector_id UUID NOT NULL REFERENCES profiles(id),
    inspector_name VARCHAR(255) NOT NULL,
    checklist_data JSONB NOT NULL,
    images JSONB NOT NULL DEFAULT '[]'::jsonb,
    inspection_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_checklist_not_fsec CHECK (certificate_type <> 'fsec')
);

CREATE INDEX idx_inspection_checklists_application
    ON inspection_checklists(application_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_profiles_touch
BEFORE UPDATE ON profiles
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_establishments_touch
BEFORE UPDATE ON establishments
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_applications_touch
BEFORE UPDATE ON applications
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();

-- ============================================================
-- FUNCTION: prevent_role_change
-- A profile keeps the role it was created with
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_role_change()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.role <> NEW.role THEN
        RAISE EXCEPTION 'Cannot change the role of profile %', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_role_change
BEFORE UPDATE ON profiles
FOR EACH ROW
EXECUTE FUNCTION prevent_role_change();

-- ============================================================
-- FUNCTION: prevent_checklist_modification
-- Inspection records are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_checklist_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Inspection checklists cannot be modified or deleted.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_checklist_mod
BEFORE UPDATE OR DELETE ON inspection_checklists
FOR EACH ROW
EXECUTE FUNCTION prevent_checklist_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_checklist_mod ON inspection_checklists;
DROP TRIGGER IF EXISTS trg_prevent_role_change ON profiles;
DROP TRIGGER IF EXISTS trg_applications_touch ON applications;
DROP TRIGGER IF EXISTS trg_establishments_touch ON establishments;
DROP TRIGGER IF EXISTS trg_profiles_touch ON profiles;

DROP FUNCTION IF EXISTS prevent_checklist_modification();
DROP FUNCTION IF EXISTS prevent_role_change();
DROP FUNCTION IF EXISTS touch_updated_at();

DROP TABLE IF EXISTS inspection_checklists CASCADE;
DROP TABLE IF EXISTS application_documents CASCADE;
DROP TABLE IF EXISTS applications CASCADE;
DROP TABLE IF EXISTS establishments CASCADE;
DROP TABLE IF EXISTS profiles CASCADE;

DROP TYPE IF EXISTS application_status;
DROP TYPE IF EXISTS certificate_type;
DROP TYPE IF EXISTS establishment_status;
DROP TYPE IF EXISTS user_role;
";
