#![allow(dead_code)]

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pension_crm::db::{DbPool, SqlitePragmas, build_pool};
use pension_crm::domain::auth::Actor;
use pension_crm::domain::types::{OrganizationId, UserId};
use pension_crm::forms::status::StatusUpdateForm;
use pension_crm::repository::DieselRepository;
use pension_crm::schema::{
    areas, branches, clients, organizations, products, status_reasons, status_transition_rules,
    status_types, user_area_grants, user_branch_grants, user_permissions,
};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const ORG: i32 = 1;
pub const OTHER_ORG: i32 = 2;

/// Holds every status capability with the `all` scope.
pub const ADMIN: i32 = 1;
/// Holds every status capability scoped to area 1 (branches 10 and 11).
pub const AREA_AGENT: i32 = 2;
/// Holds `status:read` and `status:update` scoped to branch 20 only.
pub const BRANCH_AGENT: i32 = 3;
/// Holds nothing.
pub const NOBODY: i32 = 4;
/// Holds `status:bulk_update` but no `status:update`.
pub const BULK_ONLY: i32 = 5;

pub const CLIENT_BRANCH_10: i32 = 100;
pub const CLIENT_BRANCH_11: i32 = 101;
pub const CLIENT_BRANCH_20: i32 = 102;
pub const CLIENT_OTHER_ORG: i32 = 200;

pub const PENDING: i32 = 1;
pub const CONTACTED: i32 = 2;
/// Requires a reason.
pub const DECLINED: i32 = 3;
/// Terminal.
pub const PAID: i32 = 4;
/// Requires remarks.
pub const CALLBACK: i32 = 5;
/// Inactive.
pub const LEGACY: i32 = 6;
/// Belongs to the other organization.
pub const OTHER_ORG_PENDING: i32 = 7;

pub const REASON_NOT_INTERESTED: i32 = 31;
pub const REASON_PAID_IN_FULL: i32 = 41;

/// A migrated SQLite database living in a temporary directory.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join(name);
        let url = path.to_str().expect("utf-8 database path").to_string();

        let pool = build_pool(&url, SqlitePragmas::default(), Some(8)).expect("pool");
        {
            let mut conn = pool.get().expect("connection");
            conn.run_pending_migrations(MIGRATIONS)
                .expect("migrations applied");
        }

        Self { _dir: dir, pool }
    }

    /// Database with the standard organization fixture already loaded.
    pub fn seeded(name: &str) -> Self {
        let db = Self::new(name);
        seed(&mut db.pool.get().expect("connection"));
        db
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn actor(user_id: i32) -> Actor {
    actor_in(user_id, ORG)
}

pub fn actor_in(user_id: i32, organization_id: i32) -> Actor {
    Actor::new(
        UserId::new(user_id).expect("valid user"),
        OrganizationId::new(organization_id).expect("valid organization"),
    )
}

/// Monthly status change for January 2024 with no reason or remarks.
pub fn january(client_id: i32, status_type_id: i32) -> StatusUpdateForm {
    StatusUpdateForm {
        client_id,
        period_type: "monthly".into(),
        year: 2024,
        month: Some(1),
        quarter: None,
        status_type_id,
        reason_id: None,
        remarks: None,
        has_payment: false,
    }
}

fn grant(conn: &mut SqliteConnection, user_id: i32, action: &str, scope: &str) {
    diesel::insert_into(user_permissions::table)
        .values((
            user_permissions::user_id.eq(user_id),
            user_permissions::organization_id.eq(ORG),
            user_permissions::resource.eq("status"),
            user_permissions::action.eq(action),
            user_permissions::scope.eq(scope),
        ))
        .execute(conn)
        .expect("permission inserted");
}

fn status_type(
    conn: &mut SqliteConnection,
    id: i32,
    organization_id: i32,
    code: &str,
    flags: (bool, bool, bool, bool),
) {
    let (is_terminal, requires_reason, requires_remarks, is_active) = flags;
    diesel::insert_into(status_types::table)
        .values((
            status_types::id.eq(id),
            status_types::organization_id.eq(organization_id),
            status_types::code.eq(code),
            status_types::name.eq(code.to_lowercase()),
            status_types::is_terminal.eq(is_terminal),
            status_types::requires_reason.eq(requires_reason),
            status_types::requires_remarks.eq(requires_remarks),
            status_types::is_active.eq(is_active),
        ))
        .execute(conn)
        .expect("status type inserted");
}

/// Two organizations, three areas, four clients, a status catalog and a
/// set of users with different grants.
pub fn seed(conn: &mut SqliteConnection) {
    diesel::insert_into(organizations::table)
        .values(&vec![
            (organizations::id.eq(ORG), organizations::name.eq("North")),
            (organizations::id.eq(OTHER_ORG), organizations::name.eq("South")),
        ])
        .execute(conn)
        .expect("organizations inserted");

    diesel::insert_into(products::table)
        .values(&vec![
            (
                products::id.eq(1),
                products::organization_id.eq(ORG),
                products::name.eq("Pension loan"),
            ),
            (
                products::id.eq(2),
                products::organization_id.eq(OTHER_ORG),
                products::name.eq("Pension loan"),
            ),
        ])
        .execute(conn)
        .expect("products inserted");

    diesel::insert_into(areas::table)
        .values(&vec![
            (areas::id.eq(1), areas::organization_id.eq(ORG), areas::name.eq("Coast")),
            (areas::id.eq(2), areas::organization_id.eq(ORG), areas::name.eq("Hills")),
            (areas::id.eq(3), areas::organization_id.eq(OTHER_ORG), areas::name.eq("Plains")),
        ])
        .execute(conn)
        .expect("areas inserted");

    diesel::insert_into(branches::table)
        .values(&vec![
            (branches::id.eq(10), branches::area_id.eq(1), branches::name.eq("Harbor")),
            (branches::id.eq(11), branches::area_id.eq(1), branches::name.eq("Bay")),
            (branches::id.eq(20), branches::area_id.eq(2), branches::name.eq("Summit")),
            (branches::id.eq(30), branches::area_id.eq(3), branches::name.eq("Field")),
        ])
        .execute(conn)
        .expect("branches inserted");

    diesel::insert_into(clients::table)
        .values(&vec![
            (
                clients::id.eq(CLIENT_BRANCH_10),
                clients::product_id.eq(1),
                clients::branch_id.eq(10),
                clients::full_name.eq("Ana Reyes"),
            ),
            (
                clients::id.eq(CLIENT_BRANCH_11),
                clients::product_id.eq(1),
                clients::branch_id.eq(11),
                clients::full_name.eq("Ben Cruz"),
            ),
            (
                clients::id.eq(CLIENT_BRANCH_20),
                clients::product_id.eq(1),
                clients::branch_id.eq(20),
                clients::full_name.eq("Carla Santos"),
            ),
            (
                clients::id.eq(CLIENT_OTHER_ORG),
                clients::product_id.eq(2),
                clients::branch_id.eq(30),
                clients::full_name.eq("Dan Lim"),
            ),
        ])
        .execute(conn)
        .expect("clients inserted");

    status_type(conn, PENDING, ORG, "PENDING", (false, false, false, true));
    status_type(conn, CONTACTED, ORG, "CONTACTED", (false, false, false, true));
    status_type(conn, DECLINED, ORG, "DECLINED", (false, true, false, true));
    status_type(conn, PAID, ORG, "PAID", (true, false, false, true));
    status_type(conn, CALLBACK, ORG, "CALLBACK", (false, false, true, true));
    status_type(conn, LEGACY, ORG, "LEGACY", (false, false, false, false));
    status_type(conn, OTHER_ORG_PENDING, OTHER_ORG, "PENDING", (false, false, false, true));

    diesel::insert_into(status_reasons::table)
        .values(&vec![
            (
                status_reasons::id.eq(REASON_NOT_INTERESTED),
                status_reasons::status_type_id.eq(DECLINED),
                status_reasons::code.eq("NOT_INTERESTED"),
                status_reasons::name.eq("Not interested"),
            ),
            (
                status_reasons::id.eq(REASON_PAID_IN_FULL),
                status_reasons::status_type_id.eq(PAID),
                status_reasons::code.eq("PAID_IN_FULL"),
                status_reasons::name.eq("Paid in full"),
            ),
        ])
        .execute(conn)
        .expect("reasons inserted");

    // CONTACTED may not fall back to PENDING.
    diesel::insert_into(status_transition_rules::table)
        .values((
            status_transition_rules::organization_id.eq(ORG),
            status_transition_rules::from_status_type_id.eq(CONTACTED),
            status_transition_rules::to_status_type_id.eq(PENDING),
            status_transition_rules::allowed.eq(false),
        ))
        .execute(conn)
        .expect("rule inserted");

    for action in ["read", "update", "bulk_update"] {
        grant(conn, ADMIN, action, "all");
        grant(conn, AREA_AGENT, action, "territory");
    }
    grant(conn, BRANCH_AGENT, "read", "territory");
    grant(conn, BRANCH_AGENT, "update", "territory");
    grant(conn, BULK_ONLY, "bulk_update", "all");

    diesel::insert_into(user_area_grants::table)
        .values((user_area_grants::user_id.eq(AREA_AGENT), user_area_grants::area_id.eq(1)))
        .execute(conn)
        .expect("area grant inserted");

    diesel::insert_into(user_branch_grants::table)
        .values((
            user_branch_grants::user_id.eq(BRANCH_AGENT),
            user_branch_grants::branch_id.eq(20),
        ))
        .execute(conn)
        .expect("branch grant inserted");
}
