//! # CLI Command Implementations

use crate::api::{self, new_transaction_id};
use crate::config::Settings;
use crate::AppError;
use concordance_core::{
    AggregateConcept, ChangeRecord, ConceptKind, ConceptService, EventDetails, StorageBackend,
};
use std::path::{Path, PathBuf};

/// Maximum payload file size (16 MB).
const MAX_PAYLOAD_FILE_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// PAYLOAD LOADING
// =============================================================================

/// Canonicalize an input path and make sure it is a regular file within the
/// size limit.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_PAYLOAD_FILE_SIZE {
        return Err(AppError::Payload(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_PAYLOAD_FILE_SIZE
        )));
    }

    Ok(canonical)
}

/// Read an aggregate concept from a JSON file.
pub fn load_payload(path: &Path) -> Result<AggregateConcept, AppError> {
    let path = validate_file_path(path)?;
    let data = std::fs::read(&path)
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    serde_json::from_slice(&data).map_err(|e| AppError::Payload(e.to_string()))
}

fn open_service(settings: &Settings) -> Result<ConceptService<StorageBackend>, AppError> {
    Ok(ConceptService::new(settings.open_store()?))
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings) -> Result<(), AppError> {
    let store = settings.open_store()?;

    println!("Concordance Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", settings.host);
    println!("  Port:       {}", settings.port);
    println!("  Backend:    {}", settings.backend.as_str());
    println!("  Database:   {:?}", settings.database);
    println!("  Rate limit: {}/s", settings.rate_limit);
    println!();
    println!("Endpoints:");
    println!("  PUT /{{type-path}}/{{uuid}}   - Write a concept");
    println!("  GET /{{type-path}}/{{uuid}}   - Read a concept");
    println!("  GET /{{type-path}}/__count  - Count concepts");
    println!("  GET /__health             - Health check");
    println!("  GET /__gtg                - Good to go");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(settings, store).await
}

// =============================================================================
// WRITE COMMAND
// =============================================================================

/// Write the payload in `file`.
pub fn write_file(
    service: &ConceptService<StorageBackend>,
    file: &Path,
    transaction_id: &str,
) -> Result<ChangeRecord, AppError> {
    let aggregate = load_payload(file)?;
    Ok(service.write(&aggregate, transaction_id)?)
}

/// Write an aggregate from a JSON file.
pub fn cmd_write(
    settings: &Settings,
    json: bool,
    file: &Path,
    transaction_id: Option<String>,
) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let transaction_id = transaction_id.unwrap_or_else(new_transaction_id);
    let record = write_file(&service, file, &transaction_id)?;

    if json {
        print_json(&record);
        return Ok(());
    }

    println!("Transaction: {}", transaction_id);
    println!("Updated IDs: {}", record.updated_ids.join(", "));
    println!();
    println!("Events:");
    for event in &record.events {
        let detail = match &event.event_details {
            EventDetails::ConceptUpdated => "Concept Updated".to_string(),
            EventDetails::ConcordanceAdded { old_id, new_id } => {
                format!("Concordance Added {} -> {}", old_id, new_id)
            }
            EventDetails::ConcordanceRemoved { old_id, new_id } => {
                format!("Concordance Removed {} -> {}", old_id, new_id)
            }
        };
        println!(
            "  {:<14} {:<38} {}",
            event.concept_type, event.concept_uuid, detail
        );
    }

    Ok(())
}

// =============================================================================
// READ COMMAND
// =============================================================================

/// Print the stored aggregate for a canonical id.
pub fn cmd_read(settings: &Settings, json: bool, uuid: &str) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let Some(aggregate) = service.read(uuid, &new_transaction_id())? else {
        return Err(AppError::Payload(format!("concept {} not found", uuid)));
    };

    if json {
        print_json(&aggregate);
        return Ok(());
    }

    println!("{} ({})", aggregate.pref_label, aggregate.kind);
    println!("prefUUID:      {}", aggregate.pref_uuid);
    if let Some(hash) = &aggregate.aggregate_hash {
        println!("aggregateHash: {}", hash);
    }
    println!();
    println!("Sources ({}):", aggregate.source_representations.len());
    for source in &aggregate.source_representations {
        println!(
            "  {} {}:{} {}",
            source.uuid, source.authority, source.authority_value, source.pref_label
        );
    }

    Ok(())
}

// =============================================================================
// COUNT COMMAND
// =============================================================================

/// Count canonical concepts, optionally of one kind.
pub fn cmd_count(settings: &Settings, json: bool, kind: Option<&str>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let kind = kind.map(str::parse::<ConceptKind>).transpose()?;
    let count = match kind {
        Some(kind) => service.count_of(kind)?,
        None => service.count()?,
    };

    if json {
        print_json(&serde_json::json!({
            "type": kind.map(|k| k.to_string()),
            "count": count,
        }));
    } else {
        println!("{}", count);
    }
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Verify the store is reachable.
pub fn cmd_check(settings: &Settings, json: bool) -> Result<(), AppError> {
    let service = open_service(settings)?;
    service.check()?;

    if json {
        print_json(&serde_json::json!({
            "status": "ok",
            "backend": settings.backend.as_str(),
            "database": settings.database.to_string_lossy(),
        }));
    } else {
        println!("OK ({} at {:?})", settings.backend.as_str(), settings.database);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, FileConfig, Overrides};
    use tempfile::tempdir;

    fn redb_settings(dir: &Path) -> Settings {
        let cli = Overrides {
            database: Some(dir.join("cli.redb")),
            backend: Some(Backend::Redb),
            ..Overrides::default()
        };
        Settings::resolve(cli, FileConfig::default(), |_| None).expect("settings")
    }

    const PAYLOAD: &str = r#"{
        "prefUUID": "p",
        "prefLabel": "Acme",
        "type": "Brand",
        "sourceRepresentations": [
            {"uuid": "p", "prefLabel": "Acme", "type": "Brand", "authority": "TME", "authorityValue": "acme"},
            {"uuid": "s", "prefLabel": "Acme Ltd", "type": "Brand", "authority": "Smartlogic", "authorityValue": "s"}
        ]
    }"#;

    #[test]
    fn written_file_is_readable_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let file = temp.path().join("payload.json");
        std::fs::write(&file, PAYLOAD).expect("write payload");
        let settings = redb_settings(temp.path());

        {
            let service = open_service(&settings).expect("open");
            let record = write_file(&service, &file, "tid_cli").expect("write");
            assert_eq!(record.updated_ids, vec!["p", "s"]);
        }

        {
            let service = open_service(&settings).expect("reopen");
            let stored = service.read("p", "tid_cli").expect("read").expect("found");
            assert_eq!(stored.source_representations.len(), 2);
        }
        cmd_count(&settings, true, Some("Brand")).expect("count");
        cmd_check(&settings, false).expect("check");
    }

    #[test]
    fn malformed_payload_is_rejected_before_writing() {
        let temp = tempdir().expect("temp dir");
        let file = temp.path().join("payload.json");
        std::fs::write(&file, "{not json").expect("write payload");

        let service = ConceptService::new(StorageBackend::default());
        let result = write_file(&service, &file, "tid_cli");
        assert!(matches!(result, Err(AppError::Payload(_))));
        assert_eq!(service.count().expect("count"), 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = tempdir().expect("temp dir");
        let result = load_payload(&temp.path().join("absent.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn unknown_count_type_is_rejected() {
        let temp = tempdir().expect("temp dir");
        let settings = redb_settings(temp.path());
        assert!(cmd_count(&settings, false, Some("Spaceship")).is_err());
    }
}
