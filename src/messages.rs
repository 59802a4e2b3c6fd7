//! User-facing texts and the mapping from API errors to operation errors.

use redmine_api::{RedmineError, User};

use crate::state::{ErrorKind, OperationError};

pub const MISSING_CONNECTION_FOR_TEST: &str = "Completa baseUrl y apiKey para probar la conexión.";
pub const MISSING_CONNECTION: &str = "Completa baseUrl y apiKey.";
pub const MISSING_ISSUE_FIELDS: &str = "Completa baseUrl, apiKey, projectId y subject.";
pub const MISSING_PROJECT_FOR_CATEGORIES: &str =
    "Debes seleccionar un proyecto primero para cargar sus categorías.";
pub const MISSING_FILES: &str = "Selecciona al menos un archivo.";
pub const OPERATION_DISABLED: &str = "Operación no disponible en esta configuración.";

pub const CONNECTION_OK: &str = "✅ Conexión exitosa";
pub const INVALID_API_KEY: &str = "❌ API Key inválida o sin permisos.";
pub const UNREACHABLE: &str = "❌ No se puede conectar. Verifica la URL o problemas de CORS.";
pub const GENERIC_FAILURE: &str = "Ocurrió un error al comunicar con Redmine.";

pub const ISSUE_CREATED: &str = "Ticket creado correctamente.";
pub const NO_CATEGORIES: &str = "El proyecto no tiene categorías configuradas.";

pub fn issues_found(total: u64) -> String {
    format!("Se encontraron {} tickets.", total)
}

pub fn projects_found(total: u64) -> String {
    format!("Se encontraron {} proyectos.", total)
}

pub fn users_found(total: u64) -> String {
    format!("Se encontraron {} usuarios.", total)
}

pub fn priorities_found(count: usize) -> String {
    format!("Se encontraron {} prioridades.", count)
}

pub fn categories_found(count: usize) -> String {
    format!("Se encontraron {} categorías.", count)
}

pub fn trackers_found(count: usize) -> String {
    format!("Se encontraron {} trackers.", count)
}

pub fn files_uploaded(count: usize) -> String {
    format!("{} archivo(s) subido(s) correctamente.", count)
}

pub fn issue_loaded(issue_id: u64) -> String {
    format!("Ticket #{} cargado.", issue_id)
}

pub fn visible_projects(total: u64) -> String {
    format!("Proyectos visibles: {}", total)
}

/// Identity line shown after a successful connection test.
pub fn connection_info(user: &User) -> String {
    let mut info = format!(
        "Usuario: {} (ID: {})",
        user.display_name().unwrap_or_else(|| "N/A".to_string()),
        user.id
    );
    if let Some(login) = user.login.as_deref().filter(|login| !login.is_empty()) {
        info.push_str(&format!(" - Login: {}", login));
    }
    if let Some(mail) = user.mail.as_deref().filter(|mail| !mail.is_empty()) {
        info.push_str(&format!(" - Email: {}", mail));
    }
    info
}

pub fn classify(err: &RedmineError) -> ErrorKind {
    match err {
        RedmineError::Authentication { .. } => ErrorKind::Auth,
        err if err.is_unreachable() => ErrorKind::Unreachable,
        _ => ErrorKind::Server,
    }
}

/// Generic formatter: the most readable message the error carries, or a
/// fixed fallback when it carries none.
pub fn describe(err: &RedmineError) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        format!("Error: {}", message.trim())
    }
}

pub fn operation_failure(err: &RedmineError) -> OperationError {
    OperationError::new(classify(err), describe(err))
}

/// Connection tests name the two common causes explicitly.
pub fn connection_failure(err: &RedmineError) -> OperationError {
    let kind = classify(err);
    let message = match kind {
        ErrorKind::Auth => INVALID_API_KEY.to_string(),
        ErrorKind::Unreachable => UNREACHABLE.to_string(),
        _ => format!("❌ {}", describe(err)),
    };
    OperationError::new(kind, message)
}

pub fn upload_failure(filename: &str, err: &RedmineError) -> OperationError {
    OperationError::new(
        classify(err),
        format!("Error al subir {}: {}", filename, describe(err)),
    )
}

pub fn detail_failure(issue_id: u64, err: &RedmineError) -> OperationError {
    OperationError::new(
        classify(err),
        format!("Error al cargar ticket #{}: {}", issue_id, describe(err)),
    )
}
