//! MongoDB-backed [`DocumentStore`].

use super::{DocumentStore, ProvisionError, Step, StepOutcome};
use mongodb::bson::Document;
use mongodb::error::ErrorKind;
use mongodb::Client;
use tracing::debug;

/// Server error code for "user already exists".
const USER_EXISTS: i32 = 51003;
/// Server error code for "namespace already exists".
const NAMESPACE_EXISTS: i32 = 48;

pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub async fn connect(uri: &str) -> Result<Self, ProvisionError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| ProvisionError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

impl DocumentStore for MongoStore {
    async fn run(&mut self, step: &Step) -> Result<StepOutcome, ProvisionError> {
        let command: Document =
            mongodb::bson::to_document(&step.command()).map_err(|e| ProvisionError::Command {
                step: step.to_string(),
                message: e.to_string(),
            })?;

        debug!("runCommand on {}: {}", step.database(), step);
        match self
            .client
            .database(step.database())
            .run_command(command)
            .await
        {
            Ok(_) => Ok(StepOutcome::Applied),
            Err(e) => match e.kind.as_ref() {
                ErrorKind::Command(c) if c.code == USER_EXISTS || c.code == NAMESPACE_EXISTS => {
                    Ok(StepOutcome::AlreadyPresent)
                }
                _ => Err(ProvisionError::Command {
                    step: step.to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }
}
