use promptvault::error::StoreError;
use promptvault::store::{
    self, ConnectionRecord, LazyStore, LocalDraftRecord, NewDraft, SCHEMA_VERSION, StoreOptions,
};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "promptvault-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

async fn remove_sqlite_files(path: &std::path::Path) {
    let _ = tokio::fs::remove_file(path).await;
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let _ = tokio::fs::remove_file(side).await;
    }
}

fn connection(name: &str, service_type: &str, blob: &str) -> ConnectionRecord {
    ConnectionRecord {
        friendly_name: name.to_string(),
        service_type: service_type.to_string(),
        encrypted_key: blob.to_string(),
        endpoint: None,
        model: None,
    }
}

#[tokio::test]
async fn upsert_by_name_keeps_one_record_with_latest_fields() {
    let path = unique_sqlite_path("upsert");
    let handle = store::open(StoreOptions::new(format!("sqlite:{}", path.display())))
        .await
        .expect("open store");

    handle
        .upsert_connection(connection("work-key", "openai", "blob-1"))
        .await
        .expect("first save");

    let mut second = connection("work-key", "huggingface", "blob-2");
    second.endpoint = Some("https://api-inference.huggingface.co/models/gpt2".to_string());
    handle
        .upsert_connection(second.clone())
        .await
        .expect("second save");

    let names = handle.list_connection_names().await.expect("list");
    assert_eq!(names, vec!["work-key".to_string()]);

    let stored = handle
        .get_connection("work-key")
        .await
        .expect("get")
        .expect("record present");
    assert_eq!(stored, second);

    handle.close().await.expect("close");
    remove_sqlite_files(&path).await;
}

#[tokio::test]
async fn delete_is_a_noop_for_unknown_names() {
    let path = unique_sqlite_path("delete");
    let handle = store::open(StoreOptions::new(format!("sqlite:{}", path.display())))
        .await
        .expect("open store");

    handle
        .delete_connection("never-saved")
        .await
        .expect("deleting an absent record is fine");

    handle
        .upsert_connection(connection("a", "openai", "x"))
        .await
        .unwrap();
    handle
        .upsert_connection(connection("b", "anthropic", "y"))
        .await
        .unwrap();
    handle.delete_connection("a").await.unwrap();

    assert!(handle.get_connection("a").await.unwrap().is_none());
    assert_eq!(handle.list_connection_names().await.unwrap(), vec!["b"]);

    handle.close().await.expect("close");
    remove_sqlite_files(&path).await;
}

#[tokio::test]
async fn draft_ids_are_assigned_and_never_reused() {
    let path = unique_sqlite_path("drafts");
    let handle = store::open(StoreOptions::new(format!("sqlite:{}", path.display())))
        .await
        .expect("open store");

    let first = handle
        .insert_draft(NewDraft {
            title: "Summarize".to_string(),
            content: "Summarize the following text".to_string(),
            is_public: false,
        })
        .await
        .expect("insert first");
    let second = handle
        .insert_draft(NewDraft {
            title: "Translate".to_string(),
            content: "Translate to French".to_string(),
            is_public: true,
        })
        .await
        .expect("insert second");
    assert!(second > first);

    handle.delete_draft(second).await.expect("delete");
    let third = handle
        .insert_draft(NewDraft {
            title: "Rewrite".to_string(),
            ..Default::default()
        })
        .await
        .expect("insert third");
    assert!(third > second, "id {second} was reused as {third}");

    let mut edited = handle
        .list_drafts()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.id == first)
        .expect("first draft");
    edited.is_public = true;
    edited.content = "Summarize in one line".to_string();
    handle.upsert_draft(edited.clone()).await.expect("upsert");

    let drafts = handle.list_drafts().await.unwrap();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0], edited);
    assert_eq!(
        drafts[1],
        LocalDraftRecord {
            id: third,
            title: "Rewrite".to_string(),
            content: String::new(),
            is_public: false,
        }
    );

    handle.close().await.expect("close");
    remove_sqlite_files(&path).await;
}

#[tokio::test]
async fn concurrent_saves_to_one_name_leave_a_single_intact_record() {
    let path = unique_sqlite_path("concurrent");
    let handle = store::open(StoreOptions::new(format!("sqlite:{}", path.display())))
        .await
        .expect("open store");

    let mut tasks = Vec::new();
    for i in 0..16 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let mut record = connection("shared", "openai", &format!("blob-{i}"));
            record.model = Some(format!("model-{i}"));
            handle.upsert_connection(record).await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("upsert");
    }

    let stored = handle.get_connection("shared").await.unwrap().unwrap();
    let suffix = stored.encrypted_key.trim_start_matches("blob-");
    assert_eq!(stored.model.as_deref(), Some(format!("model-{suffix}").as_str()));
    assert_eq!(handle.list_connection_names().await.unwrap().len(), 1);

    handle.close().await.expect("close");
    remove_sqlite_files(&path).await;
}

#[tokio::test]
async fn lazy_store_opens_once_and_fails_after_close() {
    let path = unique_sqlite_path("lazy");
    let lazy = LazyStore::new(StoreOptions::new(format!("sqlite:{}", path.display())));
    assert!(!lazy.is_open());

    let (a, b) = tokio::join!(lazy.get(), lazy.get());
    let a = a.expect("first get").clone();
    b.expect("second get");
    assert!(lazy.is_open());

    assert_eq!(a.schema_version().await.unwrap(), SCHEMA_VERSION);
    lazy.clone()
        .get()
        .await
        .unwrap()
        .upsert_connection(connection("k", "openai", "x"))
        .await
        .unwrap();
    assert_eq!(a.list_connection_names().await.unwrap(), vec!["k"]);

    lazy.close().await.expect("close");
    let err = a
        .list_connection_names()
        .await
        .expect_err("actor is stopped");
    assert!(matches!(err, StoreError::Actor(_)), "{err:?}");

    remove_sqlite_files(&path).await;
}

#[tokio::test]
async fn in_memory_store_is_usable() {
    let handle = store::open(StoreOptions::new("sqlite::memory:"))
        .await
        .expect("open in-memory store");
    handle
        .upsert_connection(connection("mem", "anthropic", "blob"))
        .await
        .unwrap();
    assert_eq!(handle.list_connection_names().await.unwrap(), vec!["mem"]);
    handle.close().await.unwrap();
}
