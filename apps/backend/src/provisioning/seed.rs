//! Initial rows for a freshly migrated tenant database.

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait, Set,
    TransactionTrait,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::entities::{activities, contacts, deals, UserRole};
use crate::error::AppError;
use crate::repos::tenant_users::{self, TenantUser, TenantUserCreate};

/// Fixed placeholder; operators must rotate it after provisioning.
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

pub fn default_admin_email(slug: &str) -> String {
    format!("admin@{slug}.com")
}

/// Insert the tenant's first administrator. Re-running is a no-op.
pub async fn create_default_admin<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    slug: &str,
) -> Result<TenantUser, AppError> {
    let email = default_admin_email(slug);
    let (admin, inserted) = tenant_users::ensure_by_email(
        conn,
        TenantUserCreate {
            name: "Admin".to_string(),
            email,
            password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
            role: UserRole::Admin,
        },
    )
    .await?;

    if inserted {
        warn!(
            slug,
            user_id = admin.id,
            "Default admin created with the fixed placeholder password; rotate it before handing the tenant over"
        );
    }
    Ok(admin)
}

async fn demo_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    name: &str,
    email: &str,
    role: UserRole,
) -> Result<TenantUser, AppError> {
    let (user, _) = tenant_users::ensure_by_email(
        conn,
        TenantUserCreate {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
            role,
        },
    )
    .await?;
    Ok(user)
}

async fn contact<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    name: &str,
    email: &str,
    phone: &str,
    company: &str,
    notes: &str,
    created_by: i64,
) -> Result<contacts::Model, AppError> {
    let now = OffsetDateTime::now_utc();
    Ok(contacts::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        email: Set(Some(email.to_string())),
        phone: Set(Some(phone.to_string())),
        company: Set(Some(company.to_string())),
        notes: Set(Some(notes.to_string())),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?)
}

struct NewDeal<'a> {
    title: &'a str,
    amount: f64,
    status: &'a str,
    closed_at: Option<OffsetDateTime>,
    contact_id: i64,
    assigned_to: i64,
    description: &'a str,
}

async fn deal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    new: NewDeal<'_>,
) -> Result<deals::Model, AppError> {
    let now = OffsetDateTime::now_utc();
    Ok(deals::ActiveModel {
        id: NotSet,
        title: Set(new.title.to_string()),
        amount: Set(new.amount),
        status: Set(new.status.to_string()),
        closed_at: Set(new.closed_at),
        contact_id: Set(new.contact_id),
        assigned_to: Set(Some(new.assigned_to)),
        description: Set(Some(new.description.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?)
}

async fn activity<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    kind: &str,
    subject: &str,
    description: &str,
    days_ago: i64,
    links: (Option<i64>, Option<i64>),
    user_id: i64,
) -> Result<(), AppError> {
    let now = OffsetDateTime::now_utc();
    let (contact_id, deal_id) = links;
    activities::ActiveModel {
        id: NotSet,
        kind: Set(kind.to_string()),
        subject: Set(subject.to_string()),
        description: Set(Some(description.to_string())),
        happened_at: Set(now - Duration::days(days_ago)),
        contact_id: Set(contact_id),
        deal_id: Set(deal_id),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Three users, two contacts, two deals, three activities, in one transaction.
///
/// Seed-once: a database that already has contacts is left alone, so a
/// re-run of the pipeline never duplicates demo rows.
pub async fn seed_demo_data(conn: &DatabaseConnection) -> Result<(), AppError> {
    let existing = contacts::Entity::find().count(conn).await?;
    if existing > 0 {
        info!(contacts = existing, "Demo data already present; skipping seed");
        return Ok(());
    }

    let txn = conn.begin().await?;

    let admin = demo_user(&txn, "Admin User", "admin@tenant.com", UserRole::Admin).await?;
    let manager = demo_user(&txn, "Manager User", "manager@tenant.com", UserRole::Manager).await?;
    let user = demo_user(&txn, "Regular User", "user@tenant.com", UserRole::User).await?;

    let john = contact(
        &txn,
        "John Doe",
        "john@example.com",
        "+1234567890",
        "Example Corp",
        "Potential customer",
        admin.id,
    )
    .await?;
    let jane = contact(
        &txn,
        "Jane Smith",
        "jane@example.com",
        "+0987654321",
        "Smith Industries",
        "Existing customer",
        manager.id,
    )
    .await?;

    let website = deal(
        &txn,
        NewDeal {
            title: "Website Development",
            amount: 5000.0,
            status: "open",
            closed_at: None,
            contact_id: john.id,
            assigned_to: manager.id,
            description: "Custom website development project",
        },
    )
    .await?;
    let mobile = deal(
        &txn,
        NewDeal {
            title: "Mobile App",
            amount: 10000.0,
            status: "won",
            closed_at: Some(OffsetDateTime::now_utc() - Duration::days(5)),
            contact_id: jane.id,
            assigned_to: admin.id,
            description: "iOS and Android mobile application",
        },
    )
    .await?;

    activity(
        &txn,
        "call",
        "Initial consultation call",
        "Discussed project requirements",
        10,
        (Some(john.id), Some(website.id)),
        manager.id,
    )
    .await?;
    activity(
        &txn,
        "meeting",
        "Project kickoff meeting",
        "Project kickoff and timeline discussion",
        7,
        (Some(jane.id), Some(mobile.id)),
        admin.id,
    )
    .await?;
    activity(
        &txn,
        "note",
        "Follow-up notes",
        "Customer showed interest in additional features",
        3,
        (Some(john.id), None),
        user.id,
    )
    .await?;

    txn.commit().await?;
    info!("Demo data seeded");
    Ok(())
}
