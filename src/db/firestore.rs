// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Holds two-factor credential records, one document per admin email.
//! An in-memory backend with the same semantics serves tests and local
//! development without the emulator.

use crate::db::collections;
use crate::error::AppError;
use crate::models::CredentialRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use firestore::errors::FirestoreError;
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<DashMap<String, CredentialRecord>>),
    Offline,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials, so skip the default token source.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a process-local store backed by a concurrent map.
    ///
    /// Records live as long as the last clone of this handle.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── Credential Operations ─────────────────────────────────────

    /// Get the credential record for a (lower-cased) email.
    pub async fn get_credential(&self, email: &str) -> Result<Option<CredentialRecord>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::TWO_FACTOR)
                .obj()
                .one(email)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(map) => {
                // Suspend like a network read so callers see the same interleavings.
                tokio::task::yield_now().await;
                Ok(map.get(email).map(|entry| entry.value().clone()))
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Store a new credential record unless one already exists.
    ///
    /// Returns `false` when another writer created the document first; the
    /// existing record is left untouched.
    pub async fn create_credential_if_absent(
        &self,
        email: &str,
        record: &CredentialRecord,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let result: Result<CredentialRecord, FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::TWO_FACTOR)
                    .document_id(email)
                    .object(record)
                    .execute()
                    .await;

                match result {
                    Ok(_) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => {
                        tracing::warn!(email, "Credential record already exists, keeping it");
                        Ok(false)
                    }
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(map) => match map.entry(email.to_string()) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(record.clone());
                    Ok(true)
                }
            },
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Atomically read, modify and write back an existing credential record.
    ///
    /// `apply` runs against the current record. On `Ok` the modified record
    /// is written and the value returned; on `Err` nothing is written. A
    /// missing record yields `AppError::NotConfigured`.
    ///
    /// On Firestore the read and the write share one transaction, so a
    /// concurrent writer makes the commit fail instead of being overwritten.
    pub async fn update_credential<T, F>(&self, email: &str, apply: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut CredentialRecord) -> Result<T, AppError> + Send,
        T: Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

                // Reading through the transaction registers the document for
                // conflict detection at commit.
                let tx_client = client.clone_with_consistency_selector(
                    firestore::FirestoreConsistencySelector::Transaction(
                        transaction.transaction_id().clone(),
                    ),
                );
                let current: Option<CredentialRecord> = tx_client
                    .fluent()
                    .select()
                    .by_id_in(collections::TWO_FACTOR)
                    .obj()
                    .one(email)
                    .await
                    .map_err(|e| {
                        AppError::Database(format!("Failed to read credential in transaction: {}", e))
                    })?;

                let Some(mut record) = current else {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotConfigured);
                };

                let value = match apply(&mut record) {
                    Ok(value) => value,
                    Err(e) => {
                        let _ = transaction.rollback().await;
                        return Err(e);
                    }
                };

                client
                    .fluent()
                    .update()
                    .in_col(collections::TWO_FACTOR)
                    .document_id(email)
                    .object(&record)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add credential to transaction: {}", e))
                    })?;

                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

                Ok(value)
            }
            Backend::Memory(map) => {
                tokio::task::yield_now().await;

                let Some(mut entry) = map.get_mut(email) else {
                    return Err(AppError::NotConfigured);
                };
                let mut record = entry.value().clone();
                let value = apply(&mut record)?;
                *entry = record;
                Ok(value)
            }
            Backend::Offline => Err(Self::offline()),
        }
    }
}
