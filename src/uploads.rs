//! File selection and the per-file upload step.

use std::path::{Path, PathBuf};

use redmine_api::{RedmineClient, Result, UploadHandle, OCTET_STREAM};
use tokio::fs as async_fs;

/// A file chosen for upload, with the name and media type that will be
/// recorded on the issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub content_type: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = guess_content_type(&path);
        Self {
            path,
            name,
            content_type,
        }
    }
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Reads the whole file and exchanges its bytes for an upload token.
pub async fn upload_file(client: &RedmineClient, file: &SelectedFile) -> Result<UploadHandle> {
    let bytes = async_fs::read(&file.path).await?;
    let receipt = client.upload(bytes).await?;
    Ok(UploadHandle {
        token: receipt.token,
        filename: file.name.clone(),
        content_type: file.content_type.clone(),
        description: None,
    })
}

/// Removes the handle at `index`, keeping the order of the rest. Once no
/// handle is left the selection is cleared too, since uploads cannot be
/// resumed from handles alone.
pub fn remove_handle(
    handles: &mut Vec<UploadHandle>,
    selection: &mut Vec<SelectedFile>,
    index: usize,
) -> Option<UploadHandle> {
    if index >= handles.len() {
        return None;
    }
    let removed = handles.remove(index);
    if handles.is_empty() {
        selection.clear();
    }
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(token: &str) -> UploadHandle {
        UploadHandle {
            token: token.to_string(),
            filename: format!("{token}.txt"),
            content_type: "text/plain".to_string(),
            description: None,
        }
    }

    #[test]
    fn selected_file_guesses_name_and_type() {
        let file = SelectedFile::from_path("/tmp/reports/trace.log.txt");
        assert_eq!(file.name, "trace.log.txt");
        assert_eq!(file.content_type, "text/plain");

        let unknown = SelectedFile::from_path("/tmp/blob.unknownext");
        assert_eq!(unknown.content_type, OCTET_STREAM);
    }

    #[test]
    fn removing_keeps_remaining_order() {
        let mut handles = vec![handle("a"), handle("b"), handle("c")];
        let mut selection = vec![SelectedFile::from_path("/tmp/a.txt")];

        let removed = remove_handle(&mut handles, &mut selection, 1);
        assert_eq!(removed.map(|h| h.token), Some("b".to_string()));
        let tokens: Vec<&str> = handles.iter().map(|h| h.token.as_str()).collect();
        assert_eq!(tokens, vec!["a", "c"]);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn removing_last_handle_clears_selection() {
        let mut handles = vec![handle("a")];
        let mut selection = vec![SelectedFile::from_path("/tmp/a.txt")];
        remove_handle(&mut handles, &mut selection, 0);
        assert!(handles.is_empty());
        assert!(selection.is_empty());
    }

    #[test]
    fn out_of_range_index_is_a_no_op() {
        let mut handles = vec![handle("a")];
        let mut selection = vec![SelectedFile::from_path("/tmp/a.txt")];
        assert_eq!(remove_handle(&mut handles, &mut selection, 5), None);
        assert_eq!(handles.len(), 1);
        assert_eq!(selection.len(), 1);
    }
}
