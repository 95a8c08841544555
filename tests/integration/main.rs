//! Integration tests for Offshoot

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn offshoot() -> Command {
        let mut cmd = cargo_bin_cmd!("offshoot");
        cmd.env_remove("OFFSHOOT_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    /// A workspace with a config file, a storage root and an upload
    struct Workspace {
        temp: TempDir,
        config: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let config = temp.path().join("offshoot.toml");
            let root = temp.path().join("public");
            fs::write(
                &config,
                format!(
                    r#"
[storage]
root = "{}"

[mount]
model = "user"
model_id = "7"
mounted_as = "avatar"

[versions.thumb]

[versions.thumb.versions.small]

[versions.preview]
if_extension = ["pdf"]
"#,
                    root.display()
                ),
            )
            .unwrap();
            fs::write(temp.path().join("photo.jpg"), b"jpeg bytes").unwrap();

            Self { temp, config }
        }

        fn run(&self) -> Command {
            let mut cmd = offshoot();
            cmd.arg("--config").arg(&self.config).current_dir(self.temp.path());
            cmd
        }

        fn stored(&self, name: &str) -> PathBuf {
            self.temp
                .path()
                .join("public/uploads/user/avatar/7")
                .join(name)
        }

        fn cache_dir(&self) -> PathBuf {
            self.temp.path().join("public/uploads/tmp")
        }

        fn store_photo(&self) {
            self.run()
                .args(["store", "photo.jpg", "--format", "plain"])
                .assert()
                .success();
        }
    }

    fn dir_is_empty(path: &Path) -> bool {
        fs::read_dir(path).map(|mut d| d.next().is_none()).unwrap_or(true)
    }

    #[test]
    fn help_displays() {
        offshoot()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("versioned file uploads"));
    }

    #[test]
    fn version_displays() {
        offshoot()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("offshoot"));
    }

    #[test]
    fn config_path() {
        offshoot()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.run()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[storage]"))
            .stdout(predicate::str::contains("mounted_as = \"avatar\""));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        offshoot()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("cache_dir = \"uploads/tmp\""));
    }

    #[test]
    fn invalid_from_version_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[versions.preview]\nfrom_version = \"thumb\"\n").unwrap();

        offshoot()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a sibling version"));
    }

    #[test]
    fn store_writes_file_and_versions() {
        let ws = Workspace::new();

        ws.run()
            .args(["store", "photo.jpg", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/uploads/user/avatar/7/photo.jpg"))
            .stdout(predicate::str::contains("/uploads/user/avatar/7/thumb_small_photo.jpg"))
            .stdout(predicate::str::contains("preview").not());

        assert_eq!(fs::read(ws.stored("photo.jpg")).unwrap(), b"jpeg bytes");
        assert!(ws.stored("thumb_photo.jpg").exists());
        assert!(ws.stored("thumb_small_photo.jpg").exists());
        assert!(!ws.stored("preview_photo.jpg").exists());
        assert!(ws.temp.path().join("photo.jpg").exists());
        assert!(dir_is_empty(&ws.cache_dir()));
    }

    #[test]
    fn store_json_report() {
        let ws = Workspace::new();

        ws.run()
            .args(["store", "photo.jpg", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"identifier\": \"photo.jpg\""))
            .stdout(predicate::str::contains("\"thumb.small\""));
    }

    #[test]
    fn store_missing_file_fails() {
        let ws = Workspace::new();
        ws.run()
            .args(["store", "missing.jpg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found"));
    }

    #[test]
    fn url_resolves_nested_versions() {
        let ws = Workspace::new();
        ws.store_photo();

        ws.run()
            .args(["url", "photo.jpg", "thumb", "small", "-q", "v=3"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "/uploads/user/avatar/7/thumb_small_photo.jpg?v=3",
            ));
    }

    #[test]
    fn url_of_inactive_version_is_empty() {
        let ws = Workspace::new();
        ws.store_photo();

        ws.run()
            .args(["url", "photo.jpg", "preview"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn url_of_unknown_version_fails() {
        let ws = Workspace::new();
        ws.store_photo();

        ws.run()
            .args(["url", "photo.jpg", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown version: nope"));
    }

    #[test]
    fn recreate_restores_deleted_version() {
        let ws = Workspace::new();
        ws.store_photo();
        fs::remove_file(ws.stored("thumb_photo.jpg")).unwrap();

        ws.run()
            .args(["recreate", "photo.jpg", "thumb"])
            .assert()
            .success();

        assert_eq!(fs::read(ws.stored("thumb_photo.jpg")).unwrap(), b"jpeg bytes");
        assert!(ws.temp.path().join("photo.jpg").exists());
    }

    #[test]
    fn recreate_unknown_version_fails() {
        let ws = Workspace::new();
        ws.store_photo();

        ws.run()
            .args(["recreate", "photo.jpg", "banner"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown version: banner"));
    }

    #[test]
    fn remove_deletes_everything() {
        let ws = Workspace::new();
        ws.store_photo();

        ws.run().args(["remove", "photo.jpg"]).assert().success();

        assert!(!ws.stored("photo.jpg").exists());
        assert!(!ws.stored("thumb_photo.jpg").exists());
        assert!(!ws.stored("thumb_small_photo.jpg").exists());

        ws.run()
            .args(["remove", "photo.jpg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No stored file"));
    }

    #[test]
    fn cache_gc_removes_stale_entries() {
        let ws = Workspace::new();
        let stale = ws.cache_dir().join("1000000000-1-0001-0001");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("photo.jpg"), b"old").unwrap();
        let unrelated = ws.cache_dir().join("keep-me");
        fs::create_dir_all(&unrelated).unwrap();

        ws.run()
            .args(["cache", "gc", "--hours", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1"));

        assert!(!stale.exists());
        assert!(unrelated.exists());
    }
}

mod lifecycle_tests {
    use offshoot::cache::CacheArea;
    use offshoot::processing::FnProcessor;
    use offshoot::storage::FileStorage;
    use offshoot::{Mount, OffshootError, UploadedFile, Uploader, UploaderDef, VersionOptions};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn tagged(tag: &'static str) -> FnProcessor {
        FnProcessor::new(tag, move |mut bytes: Vec<u8>| {
            bytes.extend_from_slice(tag.as_bytes());
            Ok(bytes)
        })
    }

    fn definition(temp: &TempDir) -> UploaderDef {
        let root = temp.path().join("public");
        let mut def = UploaderDef::new(
            Arc::new(FileStorage::new(&root)),
            CacheArea::new(&root, "uploads/tmp"),
        );
        def.process(tagged("|root"));
        def.version("thumb", VersionOptions::new(), |thumb| {
            thumb.process(tagged("|thumb"));
            thumb.version("small", VersionOptions::new(), |small| {
                small.process(tagged("|small"));
            });
        });
        def.version("preview", VersionOptions::new().from_version("thumb"), |preview| {
            preview.process(tagged("|preview"));
        });
        def
    }

    #[tokio::test]
    async fn full_lifecycle_on_disk() {
        let temp = TempDir::new().unwrap();
        let def = Arc::new(definition(&temp));
        let stored = temp.path().join("public/uploads/post/cover/12");

        let mut uploader = Uploader::new(Arc::clone(&def), Mount::new("post", "12", "cover"));
        uploader
            .store(Some(UploadedFile::from_bytes(b"raw".to_vec(), "Cover Image.png")))
            .await
            .unwrap();

        assert_eq!(uploader.identifier(), Some("Cover_Image.png"));
        assert_eq!(std::fs::read(stored.join("Cover_Image.png")).unwrap(), b"raw|root");
        assert_eq!(
            std::fs::read(stored.join("thumb_Cover_Image.png")).unwrap(),
            b"raw|root|thumb"
        );
        assert_eq!(
            std::fs::read(stored.join("thumb_small_Cover_Image.png")).unwrap(),
            b"raw|root|thumb|small"
        );
        assert_eq!(
            std::fs::read(stored.join("preview_Cover_Image.png")).unwrap(),
            b"raw|root|thumb|preview"
        );

        let mut restored = Uploader::new(def, Mount::new("post", "12", "cover"));
        restored.retrieve_from_store("Cover_Image.png").await.unwrap();
        assert_eq!(
            restored.url_for(&["thumb", "small"]).unwrap().as_deref(),
            Some("/uploads/post/cover/12/thumb_small_Cover_Image.png")
        );

        restored.remove().await.unwrap();
        assert_eq!(std::fs::read_dir(&stored).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cached_upload_survives_a_round_trip() {
        let temp = TempDir::new().unwrap();
        let def = Arc::new(definition(&temp));

        let mut form = Uploader::new(Arc::clone(&def), Mount::default());
        form.cache(UploadedFile::from_bytes(b"raw".to_vec(), "a.png"))
            .await
            .unwrap();
        let cache_name = form.cache_name().unwrap();

        // A later request picks the cached upload back up and commits it
        let mut retry = Uploader::new(def, Mount::default());
        retry.retrieve_from_cache(&cache_name).await.unwrap();
        retry.store(None).await.unwrap();

        let stored = temp.path().join("public/uploads");
        assert_eq!(std::fs::read(stored.join("a.png")).unwrap(), b"raw|root");
        assert_eq!(
            std::fs::read(stored.join("preview_a.png")).unwrap(),
            b"raw|root|thumb|preview"
        );
    }

    #[tokio::test]
    async fn forged_cache_name_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut uploader = Uploader::new(Arc::new(definition(&temp)), Mount::default());

        let err = uploader
            .retrieve_from_cache("../../etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, OffshootError::InvalidCacheId(_)));

        let err = uploader
            .retrieve_from_cache("20240101-1-0001-0001/../secret")
            .await
            .unwrap_err();
        assert!(matches!(err, OffshootError::InvalidOriginalFilename(_)));
    }
}
