//! Document store provisioning.
//!
//! Builds the plan that prepares the web traffic store: an administrative
//! user, the application collection and its indexes. A plan can be applied
//! through any [`DocumentStore`] or rendered as a `mongosh` script.

#[cfg(feature = "mongo")]
pub mod mongo;

use crate::config::StoreConfig;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

/// Roles granted to the administrative user, all scoped to the admin database.
pub const ADMIN_ROLES: [&str; 4] = [
    "userAdminAnyDatabase",
    "readWriteAnyDatabase",
    "dbAdminAnyDatabase",
    "clusterAdmin",
];

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("cannot connect to document store: {0}")]
    Connect(String),

    #[error("{step} failed: {message}")]
    Command { step: String, message: String },

    #[error("{0}")]
    Unsupported(String),
}

/// A role grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

/// One provisioning action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateUser {
        database: String,
        user: String,
        password: String,
        roles: Vec<RoleGrant>,
    },
    CreateCollection {
        database: String,
        collection: String,
    },
    /// Ascending single-field index.
    CreateIndex {
        database: String,
        collection: String,
        field: String,
    },
}

impl Step {
    /// Database the command runs against.
    pub fn database(&self) -> &str {
        match self {
            Step::CreateUser { database, .. }
            | Step::CreateCollection { database, .. }
            | Step::CreateIndex { database, .. } => database,
        }
    }

    /// The database command document for this step.
    pub fn command(&self) -> Value {
        match self {
            Step::CreateUser {
                user,
                password,
                roles,
                ..
            } => json!({
                "createUser": user,
                "pwd": password,
                "roles": roles
                    .iter()
                    .map(|r| json!({ "role": r.role, "db": r.db }))
                    .collect::<Vec<_>>(),
            }),
            Step::CreateCollection { collection, .. } => json!({ "create": collection }),
            Step::CreateIndex {
                collection, field, ..
            } => json!({
                "createIndexes": collection,
                "indexes": [{ "key": { (field.as_str()): 1 }, "name": format!("{}_1", field) }],
            }),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateUser { database, user, .. } => {
                write!(f, "create user '{}' in '{}'", user, database)
            }
            Step::CreateCollection {
                database,
                collection,
            } => write!(f, "create collection '{}.{}'", database, collection),
            Step::CreateIndex {
                database,
                collection,
                field,
            } => write!(f, "create index {}.{} on '{}'", database, collection, field),
        }
    }
}

/// Result of running one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    /// The user or collection existed already.
    AlreadyPresent,
}

/// A store that can execute provisioning steps.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn run(&mut self, step: &Step) -> Result<StepOutcome, ProvisionError>;
}

/// Ordered provisioning steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub steps: Vec<Step>,
}

impl ProvisionPlan {
    pub fn from_config(store: &StoreConfig) -> Self {
        let mut steps = vec![
            Step::CreateUser {
                database: store.admin_database.clone(),
                user: store.admin_user.clone(),
                password: store.admin_password.clone(),
                roles: ADMIN_ROLES
                    .iter()
                    .map(|role| RoleGrant {
                        role: role.to_string(),
                        db: store.admin_database.clone(),
                    })
                    .collect(),
            },
            Step::CreateCollection {
                database: store.database.clone(),
                collection: store.collection.clone(),
            },
        ];

        steps.extend(store.indexes.iter().map(|field| Step::CreateIndex {
            database: store.database.clone(),
            collection: store.collection.clone(),
            field: field.clone(),
        }));

        Self { steps }
    }

    /// Render the plan as a `mongosh` script.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        let mut current_db: Option<&str> = None;

        for step in &self.steps {
            if current_db != Some(step.database()) {
                script.push_str(&format!(
                    "db = db.getSiblingDB({});\n",
                    quote(step.database())
                ));
                current_db = Some(step.database());
            }

            match step {
                Step::CreateUser {
                    user,
                    password,
                    roles,
                    ..
                } => {
                    script.push_str("db.createUser({\n");
                    script.push_str(&format!("  user: {},\n", quote(user)));
                    script.push_str(&format!("  pwd: {},\n", quote(password)));
                    script.push_str("  roles: [\n");
                    for (i, r) in roles.iter().enumerate() {
                        let sep = if i + 1 < roles.len() { "," } else { "" };
                        script.push_str(&format!(
                            "    {{ role: {}, db: {} }}{}\n",
                            quote(&r.role),
                            quote(&r.db),
                            sep
                        ));
                    }
                    script.push_str("  ]\n});\n");
                }
                Step::CreateCollection { collection, .. } => {
                    script.push_str(&format!("db.createCollection({});\n", quote(collection)));
                }
                Step::CreateIndex {
                    collection, field, ..
                } => {
                    script.push_str(&format!(
                        "db.getCollection({}).createIndex({{ {}: 1 }});\n",
                        quote(collection),
                        quote(field)
                    ));
                }
            }
        }

        script
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Run every step of the plan in order, stopping at the first failure.
pub async fn apply<S: DocumentStore>(
    store: &mut S,
    plan: &ProvisionPlan,
) -> Result<Vec<(Step, StepOutcome)>, ProvisionError> {
    let mut outcomes = Vec::with_capacity(plan.steps.len());

    for step in &plan.steps {
        debug!("Running: {}", step);
        let outcome = store.run(step).await?;
        match outcome {
            StepOutcome::Applied => info!("Done: {}", step),
            StepOutcome::AlreadyPresent => info!("Skipped (already present): {}", step),
        }
        outcomes.push((step.clone(), outcome));
    }

    Ok(outcomes)
}
