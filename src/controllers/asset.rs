use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::instrument;

use crate::core::error::{ConfigError, Error};
use crate::types::AssetReference;

/// Remote object host contract: upload a local file, delete by remote id.
/// Deleting an already-absent id is success.
pub(crate) trait ObjectHost {
    async fn upload(&self, local_path: &Path) -> Result<AssetReference, Error>;

    async fn delete(&self, public_id: &str) -> Result<(), Error>;
}

/// The slice of the credential store the coordinator is allowed to touch.
pub(crate) trait AssetStore {
    async fn asset_reference(
        &self,
        user_id: i32,
        slot: AssetSlot,
    ) -> Result<Option<AssetReference>, Error>;

    async fn replace_asset_reference(
        &self,
        user_id: i32,
        slot: AssetSlot,
        reference: &AssetReference,
    ) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AssetSlot {
    Avatar,
    Cover,
}

/// Removes the local temporary file when the surrounding scope exits, whether
/// by success, error or cancellation. Removal failure is log-only.
struct TempFileGuard {
    path: PathBuf,
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to remove temporary file {:?}: {}", self.path, e);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct AssetCoordinator<H> {
    host: H,
}

impl<H: ObjectHost> AssetCoordinator<H> {
    pub(crate) fn new(host: H) -> Self {
        Self { host }
    }

    /// Uploads a local temporary file and hands back the remote reference.
    /// The temporary file is gone afterwards on every path.
    #[instrument(skip(self))]
    pub(crate) async fn upload(&self, local_path: &str) -> Result<AssetReference, Error> {
        if local_path.trim().is_empty() {
            return Err(Error::MissingFile("asset"));
        }

        let _guard = TempFileGuard {
            path: PathBuf::from(local_path),
        };

        self.host.upload(Path::new(local_path)).await
    }

    /// Replaces the asset in `slot`: upload new, swap the stored reference,
    /// then delete the previous remote file. The delete comes strictly after
    /// the swap so a mid-failure leaves at worst one orphaned remote file,
    /// never a user without a working reference.
    #[instrument(skip(self, store))]
    pub(crate) async fn replace<S: AssetStore>(
        &self,
        store: &S,
        user_id: i32,
        slot: AssetSlot,
        local_path: &str,
    ) -> Result<AssetReference, Error> {
        let reference = self.upload(local_path).await?;

        let previous = store.asset_reference(user_id, slot).await?;

        store
            .replace_asset_reference(user_id, slot, &reference)
            .await?;

        if let Some(previous) = previous {
            if let Err(e) = self.host.delete(&previous.public_id).await {
                tracing::warn!(
                    "failed to delete replaced asset {}, orphan remains: {:?}",
                    previous.public_id,
                    e
                );
            }
        }

        Ok(reference)
    }

    /// Best-effort remote delete for uploads whose owning record never
    /// materialized.
    #[instrument(skip(self))]
    pub(crate) async fn discard(&self, reference: &AssetReference) {
        if let Err(e) = self.host.delete(&reference.public_id).await {
            tracing::warn!(
                "failed to discard asset {}, orphan remains: {:?}",
                reference.public_id,
                e
            );
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    url: String,
}

/// Object-host client speaking the host's HTTP API: multipart upload with
/// server-side resource-type detection, delete by public id.
#[derive(Clone)]
pub(crate) struct HttpAssetHost {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpAssetHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssetHost")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpAssetHost {
    pub(crate) fn new(user_agent: &str, url: String, api_key: String) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new().user_agent(user_agent).build()?;

        Ok(Self { client, url, api_key })
    }
}

impl ObjectHost for HttpAssetHost {
    #[instrument(skip(self))]
    async fn upload(&self, local_path: &Path) -> Result<AssetReference, Error> {
        let bytes = tokio::fs::read(local_path).await.map_err(Error::LocalFile)?;

        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("resource_type", "auto");

        let response = self
            .client
            .post(format!("{}/upload", self.url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<UploadResponse>()
            .await?;

        Ok(AssetReference {
            public_id: response.public_id,
            url: response.url,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<(), Error> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        // already gone counts as deleted
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        response.error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockHost {
        uploads: AtomicUsize,
        deleted: Mutex<Vec<String>>,
        fail_upload: bool,
        fail_delete: bool,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                uploads: AtomicUsize::new(0),
                deleted: Mutex::new(Vec::new()),
                fail_upload: false,
                fail_delete: false,
            }
        }
    }

    impl ObjectHost for MockHost {
        async fn upload(&self, _local_path: &Path) -> Result<AssetReference, Error> {
            if self.fail_upload {
                return Err(Error::AssetHost("upload failed".to_string()));
            }

            let n = self.uploads.fetch_add(1, Ordering::SeqCst);

            Ok(AssetReference {
                public_id: format!("asset-{}", n),
                url: format!("https://assets.test/asset-{}", n),
            })
        }

        async fn delete(&self, public_id: &str) -> Result<(), Error> {
            if self.fail_delete {
                return Err(Error::AssetHost("delete failed".to_string()));
            }

            self.deleted.lock().unwrap().push(public_id.to_string());

            Ok(())
        }
    }

    struct MockStore {
        references: Mutex<HashMap<(i32, AssetSlot), AssetReference>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                references: Mutex::new(HashMap::new()),
            }
        }

        fn with(user_id: i32, slot: AssetSlot, reference: AssetReference) -> Self {
            let store = Self::new();
            store
                .references
                .lock()
                .unwrap()
                .insert((user_id, slot), reference);
            store
        }

        fn stored(&self, user_id: i32, slot: AssetSlot) -> Option<AssetReference> {
            self.references.lock().unwrap().get(&(user_id, slot)).cloned()
        }
    }

    impl AssetStore for MockStore {
        async fn asset_reference(
            &self,
            user_id: i32,
            slot: AssetSlot,
        ) -> Result<Option<AssetReference>, Error> {
            Ok(self.stored(user_id, slot))
        }

        async fn replace_asset_reference(
            &self,
            user_id: i32,
            slot: AssetSlot,
            reference: &AssetReference,
        ) -> Result<(), Error> {
            self.references
                .lock()
                .unwrap()
                .insert((user_id, slot), reference.clone());

            Ok(())
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("mediacore-test-{}-{}", std::process::id(), name));
        std::fs::write(&path, b"fake image bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn replace_deletes_previous_asset_after_swap() {
        let previous = AssetReference {
            public_id: "old-avatar".to_string(),
            url: "https://assets.test/old-avatar".to_string(),
        };
        let store = MockStore::with(1, AssetSlot::Avatar, previous);
        let coordinator = AssetCoordinator::new(MockHost::new());
        let path = temp_file("replace-avatar");

        let reference = coordinator
            .replace(&store, 1, AssetSlot::Avatar, path.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(store.stored(1, AssetSlot::Avatar), Some(reference));
        assert_eq!(
            *coordinator.host.deleted.lock().unwrap(),
            vec!["old-avatar".to_string()]
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_delete_still_swaps_reference() {
        let previous = AssetReference {
            public_id: "old-avatar".to_string(),
            url: "https://assets.test/old-avatar".to_string(),
        };
        let store = MockStore::with(1, AssetSlot::Avatar, previous.clone());
        let mut host = MockHost::new();
        host.fail_delete = true;
        let coordinator = AssetCoordinator::new(host);
        let path = temp_file("replace-avatar-orphan");

        let reference = coordinator
            .replace(&store, 1, AssetSlot::Avatar, path.to_str().unwrap())
            .await
            .unwrap();

        assert_ne!(reference, previous);
        assert_eq!(store.stored(1, AssetSlot::Avatar), Some(reference));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn first_cover_upload_deletes_nothing() {
        let store = MockStore::new();
        let coordinator = AssetCoordinator::new(MockHost::new());
        let path = temp_file("first-cover");

        coordinator
            .replace(&store, 1, AssetSlot::Cover, path.to_str().unwrap())
            .await
            .unwrap();

        assert!(store.stored(1, AssetSlot::Cover).is_some());
        assert!(coordinator.host.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_path_fails_before_any_upload() {
        let coordinator = AssetCoordinator::new(MockHost::new());

        assert!(matches!(
            coordinator.upload("  ").await,
            Err(Error::MissingFile(_))
        ));
        assert_eq!(coordinator.host.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_upload_still_removes_temp_file() {
        let mut host = MockHost::new();
        host.fail_upload = true;
        let coordinator = AssetCoordinator::new(host);
        let path = temp_file("failed-upload");

        let result = coordinator.upload(path.to_str().unwrap()).await;

        assert!(matches!(result, Err(Error::AssetHost(_))));
        assert!(!path.exists());
    }
}
