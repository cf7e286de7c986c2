use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::{
    ClientRecord, CreateClientParams, CreateDeadlineParams, CreateDeadlineTypeParams,
    CreateMatterParams, Database, DeadlineStatus, MatterRecord, MatterStatus, MatterType,
};
use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub matter_type: MatterType,
    pub default_reminder_days: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct CatalogConfig {
    default_reminder_days: Vec<i32>,
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    matter_type: String,
    names: Vec<String>,
}

static CATALOG: LazyLock<Result<Vec<CatalogEntry>, String>> =
    LazyLock::new(|| parse_catalog(include_str!("deadline_catalog.toml")));

fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, String> {
    let parsed: CatalogConfig =
        toml::from_str(raw).map_err(|e| format!("invalid deadline catalog TOML: {}", e))?;
    let mut out = Vec::new();
    for group in parsed.groups {
        let matter_type = MatterType::from_db_value(&group.matter_type).ok_or_else(|| {
            format!(
                "invalid matter_type '{}' in deadline catalog",
                group.matter_type
            )
        })?;
        for name in group.names {
            out.push(CatalogEntry {
                name,
                matter_type,
                default_reminder_days: parsed.default_reminder_days.clone(),
            });
        }
    }
    Ok(out)
}

pub fn deadline_catalog() -> Result<&'static [CatalogEntry], String> {
    match &*CATALOG {
        Ok(entries) => Ok(entries.as_slice()),
        Err(err) => Err(err.clone()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub types_created: usize,
    pub clients_created: usize,
    pub matters_created: usize,
    pub deadlines_created: usize,
}

/// Install the standard deadline types. Existing (name, matter type) pairs are
/// left as they are. Returns the number of types created.
pub async fn seed_deadline_types(db: &dyn Database) -> Result<usize, DatabaseError> {
    let catalog = deadline_catalog().map_err(DatabaseError::Serialization)?;
    let mut created = 0;
    for entry in catalog {
        if db
            .find_deadline_type(&entry.name, entry.matter_type)
            .await?
            .is_some()
        {
            continue;
        }
        db.create_deadline_type(&CreateDeadlineTypeParams {
            name: entry.name.clone(),
            matter_type: entry.matter_type,
            default_reminder_days: entry.default_reminder_days.clone(),
        })
        .await?;
        tracing::info!("Created: {} ({})", entry.name, entry.matter_type.label());
        created += 1;
    }
    Ok(created)
}

struct SampleClient {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    notes: Option<&'static str>,
}

struct SampleMatter {
    client: &'static str,
    title: &'static str,
    matter_type: MatterType,
    property_address: &'static str,
    deadlines: &'static [SampleDeadline],
}

struct SampleDeadline {
    type_name: &'static str,
    offset_days: i64,
    description: &'static str,
    status: DeadlineStatus,
}

const fn upcoming(type_name: &'static str, offset_days: i64) -> SampleDeadline {
    SampleDeadline {
        type_name,
        offset_days,
        description: "",
        status: DeadlineStatus::Upcoming,
    }
}

const SAMPLE_CLIENTS: &[SampleClient] = &[
    SampleClient {
        name: "Acme Development Corp",
        email: "jsmith@acmedev.com",
        phone: "(303) 555-0101",
        notes: Some("Major commercial developer"),
    },
    SampleClient {
        name: "Mountain View LLC",
        email: "sarah@mountainviewllc.com",
        phone: "(303) 555-0202",
        notes: None,
    },
    SampleClient {
        name: "Riverside Properties",
        email: "info@riversideprops.com",
        phone: "(720) 555-0303",
        notes: None,
    },
];

const SAMPLE_MATTERS: &[SampleMatter] = &[
    SampleMatter {
        client: "Acme Development Corp",
        title: "Office Building Acquisition - 123 Main St",
        matter_type: MatterType::Transaction,
        property_address: "123 Main Street, Denver, CO 80202",
        deadlines: &[
            upcoming("DD Expiration", 5),
            upcoming("Extension Election Deadline", 3),
            upcoming("Financing Contingency", 18),
            upcoming("Closing Date", 35),
        ],
    },
    SampleMatter {
        client: "Mountain View LLC",
        title: "Retail Center Purchase - Canyon Blvd",
        matter_type: MatterType::Transaction,
        property_address: "456 Canyon Blvd, Boulder, CO 80302",
        deadlines: &[
            SampleDeadline {
                type_name: "Inspection Deadline",
                offset_days: -2,
                description: "Phase I ESA results pending",
                status: DeadlineStatus::Upcoming,
            },
            upcoming("DD Expiration", 12),
            upcoming("Closing Date", 45),
        ],
    },
    SampleMatter {
        client: "Riverside Properties",
        title: "Rezoning Application - Riverside Parcel",
        matter_type: MatterType::LandUse,
        property_address: "789 River Road, Lakewood, CO 80228",
        deadlines: &[
            SampleDeadline {
                type_name: "Application Filing Date",
                offset_days: -10,
                description: "",
                status: DeadlineStatus::Completed,
            },
            SampleDeadline {
                type_name: "Resubmittal Deadline",
                offset_days: 7,
                description: "Updated traffic study needed",
                status: DeadlineStatus::Upcoming,
            },
            upcoming("Hearing Date", 28),
            upcoming("Appeal Deadline", 58),
        ],
    },
    SampleMatter {
        client: "Acme Development Corp",
        title: "PUD Amendment - Tech Campus Phase 2",
        matter_type: MatterType::LandUse,
        property_address: "1000 Innovation Dr, Broomfield, CO 80021",
        deadlines: &[
            upcoming("Application Filing Date", 1),
            upcoming("Hearing Date", 42),
        ],
    },
];

async fn client_for(
    db: &dyn Database,
    sample: &SampleClient,
    summary: &mut SeedSummary,
) -> Result<ClientRecord, DatabaseError> {
    if let Some(existing) = db.find_client_by_name(sample.name).await? {
        return Ok(existing);
    }
    summary.clients_created += 1;
    db.create_client(&CreateClientParams {
        name: sample.name.to_string(),
        email: Some(sample.email.to_string()),
        phone: Some(sample.phone.to_string()),
        notes: sample.notes.map(str::to_string),
    })
    .await
}

async fn matter_for(
    db: &dyn Database,
    client: &ClientRecord,
    sample: &SampleMatter,
    summary: &mut SeedSummary,
) -> Result<MatterRecord, DatabaseError> {
    if let Some(existing) = db.find_matter_by_title(client.id, sample.title).await? {
        return Ok(existing);
    }
    summary.matters_created += 1;
    db.create_matter(&CreateMatterParams {
        client_id: client.id,
        title: sample.title.to_string(),
        matter_type: sample.matter_type,
        property_address: Some(sample.property_address.to_string()),
        status: MatterStatus::Active,
        external_project_id: None,
        notes: None,
    })
    .await
}

/// Create the demo clients, matters, and deadlines, dated relative to `today`.
/// Expects the deadline types to be installed already.
pub async fn seed_samples(
    db: &dyn Database,
    today: NaiveDate,
) -> Result<SeedSummary, DatabaseError> {
    let mut summary = SeedSummary::default();
    for sample_matter in SAMPLE_MATTERS {
        let Some(sample_client) = SAMPLE_CLIENTS
            .iter()
            .find(|client| client.name == sample_matter.client)
        else {
            continue;
        };
        let client = client_for(db, sample_client, &mut summary).await?;
        let matter = matter_for(db, &client, sample_matter, &mut summary).await?;

        for sample in sample_matter.deadlines {
            let deadline_type = db
                .find_deadline_type(sample.type_name, sample_matter.matter_type)
                .await?
                .ok_or_else(|| {
                    DatabaseError::Query(format!(
                        "deadline type '{}' is not installed",
                        sample.type_name
                    ))
                })?;
            if db
                .find_deadline_by_type(matter.id, deadline_type.id)
                .await?
                .is_some()
            {
                continue;
            }
            db.create_deadline(
                matter.id,
                &CreateDeadlineParams {
                    deadline_type_id: deadline_type.id,
                    date: today + Duration::days(sample.offset_days),
                    description: sample.description.to_string(),
                    reminder_days: Vec::new(),
                    status: sample.status,
                    external_task_id: None,
                },
            )
            .await?;
            summary.deadlines_created += 1;
        }
    }
    tracing::info!(
        clients = summary.clients_created,
        matters = summary.matters_created,
        deadlines = summary.deadlines_created,
        "sample data created"
    );
    Ok(summary)
}

pub async fn seed(
    db: &dyn Database,
    with_samples: bool,
    today: NaiveDate,
) -> Result<SeedSummary, DatabaseError> {
    let types_created = seed_deadline_types(db).await?;
    let mut summary = if with_samples {
        seed_samples(db, today).await?
    } else {
        SeedSummary::default()
    };
    summary.types_created = types_created;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::libsql::LibSqlBackend;
    use crate::db::{DeadlineStore, DeadlineTypeStore};

    #[test]
    fn bundled_catalog_has_both_practice_areas() {
        let catalog = deadline_catalog().expect("catalog should parse");
        let count = |kind| catalog.iter().filter(|e| e.matter_type == kind).count();
        assert_eq!(count(MatterType::Transaction), 9);
        assert_eq!(count(MatterType::LandUse), 9);
        assert!(
            catalog
                .iter()
                .all(|entry| entry.default_reminder_days == vec![30, 14, 7, 3, 1])
        );
    }

    #[test]
    fn sample_deadlines_reference_catalog_types() {
        let catalog = deadline_catalog().expect("catalog should parse");
        for matter in SAMPLE_MATTERS {
            for deadline in matter.deadlines {
                assert!(
                    catalog.iter().any(|entry| entry.name == deadline.type_name
                        && entry.matter_type == matter.matter_type),
                    "unknown type {}",
                    deadline.type_name
                );
            }
        }
    }

    #[tokio::test]
    async fn seeding_twice_creates_everything_once() {
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let backend = LibSqlBackend::new_local(&tmpdir.path().join("seed.db"))
            .await
            .expect("backend");
        backend.run_migrations().await.expect("migrations");
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).expect("date");

        let first = seed(&backend, true, today).await.expect("first seed");
        assert_eq!(
            first,
            SeedSummary {
                types_created: 18,
                clients_created: 3,
                matters_created: 4,
                deadlines_created: 13,
            }
        );

        let second = seed(&backend, true, today).await.expect("second seed");
        assert_eq!(second, SeedSummary::default());
        assert_eq!(backend.list_deadline_types().await.expect("types").len(), 18);

        let overdue = backend
            .list_reminder_candidates()
            .await
            .expect("candidates")
            .into_iter()
            .filter(|c| c.deadline.date < today)
            .count();
        assert_eq!(overdue, 1, "only the inspection deadline is overdue and open");
    }
}
