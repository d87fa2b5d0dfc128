//! Resource Manager: folder enumeration

use serde::Deserialize;

use super::{CloudClient, ListPages, ListResponse};
use crate::error::CloudError;
use crate::pager::{self, Page};

/// Resource-manager container grouping clusters and other resources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cloud_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersResponse {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListResponse for ListFoldersResponse {
    type Item = Folder;

    fn into_page(self) -> Page<Folder> {
        Page::new(self.folders, self.next_page_token)
    }
}

impl CloudClient {
    /// Page source over the folders of a cloud
    pub fn folder_pages(&self, cloud_id: &str) -> ListPages<'_, ListFoldersResponse> {
        let url = format!("{}/folders", self.endpoints().resource_manager);
        self.list_pages(url, ("cloudId", cloud_id.to_string()))
    }

    /// All folders of a cloud, in server order
    pub async fn list_folders(&self, cloud_id: &str) -> Result<Vec<Folder>, CloudError> {
        pager::collect_all(&self.folder_pages(cloud_id)).await
    }
}
