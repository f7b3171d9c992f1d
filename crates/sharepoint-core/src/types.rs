//! Result types returned by the facade and the Graph payloads they are
//! built from.

use serde::{Deserialize, Serialize};

/// Whether a drive item is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// A file or folder as reported to tool callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Virtual path, always starting with `/`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Descriptor {
    /// Builds a descriptor for `item` located at the virtual `path`.
    ///
    /// Folders never carry a size or MIME type.
    pub(crate) fn from_item(item: DriveItem, path: String) -> Self {
        let kind = if item.folder.is_some() {
            ItemKind::Folder
        } else {
            ItemKind::File
        };
        let (size, mime_type) = match kind {
            ItemKind::File => (item.size, item.file.and_then(|f| f.mime_type)),
            ItemKind::Folder => (None, None),
        };
        Self {
            name: item.name,
            kind,
            path,
            size,
            modified: item.last_modified_date_time,
            created: item.created_date_time,
            id: item.id,
            mime_type,
        }
    }
}

/// Site metadata returned by `get_site_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub description: String,
}

// Graph wire types.

#[derive(Debug, Deserialize)]
pub(crate) struct GraphList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphIdentity {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub file: Option<FileFacet>,
    #[serde(default)]
    pub folder: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub folder: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: &'static str,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_file_item_maps_to_descriptor() {
        let item: DriveItem = serde_json::from_value(json!({
            "id": "01ABC",
            "name": "report.pdf",
            "size": 2048,
            "lastModifiedDateTime": "2024-01-15T10:30:00Z",
            "createdDateTime": "2024-01-10T08:00:00Z",
            "file": { "mimeType": "application/pdf" }
        }))
        .unwrap();

        let descriptor = Descriptor::from_item(item, "/docs/report.pdf".to_string());
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "name": "report.pdf",
                "type": "file",
                "path": "/docs/report.pdf",
                "size": 2048,
                "modified": "2024-01-15T10:30:00Z",
                "created": "2024-01-10T08:00:00Z",
                "id": "01ABC",
                "mimeType": "application/pdf"
            })
        );
    }

    #[test]
    fn test_folder_item_omits_size_and_mime_type() {
        let item: DriveItem = serde_json::from_value(json!({
            "id": "01DEF",
            "name": "Archive",
            "size": 99,
            "folder": { "childCount": 3 }
        }))
        .unwrap();

        let value = serde_json::to_value(Descriptor::from_item(item, "/Archive".to_string())).unwrap();
        assert_eq!(value["type"], "folder");
        assert!(value.get("size").is_none());
        assert!(value.get("mimeType").is_none());
        assert!(value.get("modified").is_none());
    }

    #[test]
    fn test_site_info_defaults_missing_description() {
        let site: SiteInfo = serde_json::from_value(json!({
            "id": "contoso.sharepoint.com,1,2",
            "name": "eng",
            "webUrl": "https://contoso.sharepoint.com/sites/eng"
        }))
        .unwrap();
        assert_eq!(site.description, "");
        assert_eq!(
            serde_json::to_value(&site).unwrap()["webUrl"],
            "https://contoso.sharepoint.com/sites/eng"
        );
    }

    #[test]
    fn test_create_folder_request_shape() {
        let body = CreateFolderRequest {
            name: "new",
            folder: serde_json::Map::new(),
            conflict_behavior: "fail",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "name": "new", "folder": {}, "@microsoft.graph.conflictBehavior": "fail" })
        );
    }

    #[test]
    fn test_graph_list_tolerates_missing_value() {
        let list: GraphList<GraphIdentity> = serde_json::from_str("{}").unwrap();
        assert!(list.value.is_empty());
    }
}
