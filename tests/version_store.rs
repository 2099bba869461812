//! Version lineage: json edits, checkouts, imports and their atomicity.

mod common;

use assert_matches::assert_matches;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

use common::{block_current_version_updates, png_bytes, scene_document, TestContext};
use scenegen::entities::version::VersionType;
use scenegen::entities::{image_asset, version};
use scenegen::error::{AppError, ErrorCode};

#[tokio::test]
async fn new_project_has_no_current_version() {
    let ctx = TestContext::new().await;
    let created = ctx.versions.create_project("Kitchen", Some("de")).await.unwrap();

    assert_eq!(created.output_language, "de");
    assert_eq!(created.current_version_id, None);
    assert!(ctx.versions.get_versions_with_urls(created.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_project_name_is_rejected() {
    let ctx = TestContext::new().await;
    assert_matches!(
        ctx.versions.create_project("   ", None).await,
        Err(AppError::Validation { code: ErrorCode::MissingField, .. })
    );
}

#[tokio::test]
async fn import_creates_asset_and_current_version() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;

    assert_eq!(imported.version_type, VersionType::Imported);
    assert_eq!(imported.parent_version_id, None);
    assert_eq!(imported.scene_document, Some(scene_document()));
    assert_eq!(project.current_version_id, Some(imported.id));

    let asset = image_asset::Entity::find_by_id(imported.image_asset_id.unwrap())
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(asset.mime_type, "image/png");
    assert_eq!((asset.width, asset.height), (16, 12));
    assert!(ctx.blobs.contains(&asset.storage_path));
}

#[tokio::test]
async fn import_rejects_non_images_before_writing() {
    let ctx = TestContext::new().await;
    let created = ctx.versions.create_project("Hall", None).await.unwrap();

    let result = ctx
        .versions
        .import_image(created.id, "notes.txt", b"plain text".to_vec(), None)
        .await;

    assert_matches!(
        result,
        Err(AppError::Validation { code: ErrorCode::InvalidImage, .. })
    );
    assert!(ctx.blobs.paths().is_empty());
    assert_eq!(ctx.current_version_id(created.id).await, None);
}

#[tokio::test]
async fn json_edit_keeps_image_and_links_parent() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;

    let edited_doc = json!({ "objects": [{ "id": "sofa", "label": "Corner sofa" }] });
    let edited = ctx
        .versions
        .create_json_edit_version(project.id, &edited_doc.to_string())
        .await
        .unwrap();

    assert_eq!(edited.version_type, VersionType::JsonEdit);
    assert_eq!(edited.parent_version_id, Some(imported.id));
    assert_eq!(edited.image_asset_id, imported.image_asset_id);
    assert_eq!(edited.scene_document, Some(edited_doc));
    assert_eq!(ctx.current_version_id(project.id).await, Some(edited.id));

    // The earlier version is untouched.
    let original = ctx.versions.get_version(project.id, imported.id).await.unwrap();
    assert_eq!(original, imported);
}

#[tokio::test]
async fn json_edit_on_empty_project_has_no_image_or_parent() {
    let ctx = TestContext::new().await;
    let created = ctx.versions.create_project("Studio", None).await.unwrap();

    let edited = ctx
        .versions
        .create_json_edit_version(created.id, r#"{"objects":[]}"#)
        .await
        .unwrap();

    assert_eq!(edited.parent_version_id, None);
    assert_eq!(edited.image_asset_id, None);
    assert_eq!(ctx.versions.image_url(&edited).await.unwrap(), None);
}

#[tokio::test]
async fn invalid_documents_write_nothing() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;

    for bad in ["{not json", "[1, 2, 3]", "42", ""] {
        let result = ctx.versions.create_json_edit_version(project.id, bad).await;
        assert_matches!(
            result,
            Err(AppError::Validation { code: ErrorCode::InvalidDocument, .. }),
            "input {bad:?}"
        );
    }

    assert_eq!(version::Entity::find().count(&ctx.db).await.unwrap(), 1);
    assert_eq!(ctx.current_version_id(project.id).await, Some(imported.id));
}

#[tokio::test]
async fn json_edit_on_unknown_project_is_not_found() {
    let ctx = TestContext::new().await;
    assert_matches!(
        ctx.versions.create_json_edit_version(Uuid::now_v7(), "{}").await,
        Err(AppError::NotFound { code: ErrorCode::ProjectNotFound, .. })
    );
}

#[tokio::test]
async fn checkout_copies_source_and_parents_on_it() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;
    ctx.versions
        .create_json_edit_version(project.id, r#"{"objects":[]}"#)
        .await
        .unwrap();

    let checkout = ctx
        .versions
        .create_checkout_version(project.id, imported.id)
        .await
        .unwrap();

    assert_eq!(checkout.version_type, VersionType::Checkout);
    assert_eq!(checkout.parent_version_id, Some(imported.id));
    assert_eq!(checkout.image_asset_id, imported.image_asset_id);
    assert_eq!(checkout.scene_document, imported.scene_document);
    assert_ne!(checkout.id, imported.id);
    assert_eq!(ctx.current_version_id(project.id).await, Some(checkout.id));
}

#[tokio::test]
async fn checkout_validates_source_before_writing() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;
    let (other, other_version) = ctx.seed_project().await;

    assert_matches!(
        ctx.versions.create_checkout_version(project.id, Uuid::now_v7()).await,
        Err(AppError::NotFound { code: ErrorCode::VersionNotFound, .. })
    );
    assert_matches!(
        ctx.versions.create_checkout_version(project.id, other_version.id).await,
        Err(AppError::Validation { code: ErrorCode::InvalidSourceVersion, .. })
    );

    assert_eq!(version::Entity::find().count(&ctx.db).await.unwrap(), 2);
    assert_eq!(ctx.current_version_id(project.id).await, Some(imported.id));
    assert_eq!(ctx.current_version_id(other.id).await, Some(other_version.id));
}

#[tokio::test]
async fn versions_are_listed_newest_first_with_urls() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;
    let edited = ctx
        .versions
        .create_json_edit_version(project.id, r#"{"objects":[]}"#)
        .await
        .unwrap();
    let checkout = ctx
        .versions
        .create_checkout_version(project.id, imported.id)
        .await
        .unwrap();

    let listed = ctx.versions.get_versions_with_urls(project.id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|v| v.version.id).collect();
    assert_eq!(ids, vec![checkout.id, edited.id, imported.id]);

    for entry in &listed {
        let url = entry.image_url.as_deref().unwrap();
        assert!(url.starts_with("http://blobs.test/projects/"), "{url}");
    }
}

#[tokio::test]
async fn lineage_walks_back_to_the_root() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;
    let edited = ctx
        .versions
        .create_json_edit_version(project.id, r#"{"objects":[]}"#)
        .await
        .unwrap();
    let checkout = ctx
        .versions
        .create_checkout_version(project.id, edited.id)
        .await
        .unwrap();

    let chain: Vec<Uuid> = ctx
        .versions
        .lineage(checkout.id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(chain, vec![checkout.id, edited.id, imported.id]);
}

#[tokio::test]
async fn concurrent_edits_leave_newest_version_current() {
    let ctx = TestContext::new().await;
    let (project, _) = ctx.seed_project().await;

    let (a, b) = tokio::join!(
        ctx.versions
            .create_json_edit_version(project.id, r#"{"objects":[{"id":"a"}]}"#),
        ctx.versions
            .create_json_edit_version(project.id, r#"{"objects":[{"id":"b"}]}"#),
    );
    a.unwrap();
    b.unwrap();

    let listed = ctx.versions.get_versions_with_urls(project.id).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(
        ctx.current_version_id(project.id).await,
        Some(listed[0].version.id)
    );
}

#[tokio::test]
async fn failed_pointer_update_rolls_back_the_version() {
    let ctx = TestContext::new().await;
    let (project, imported) = ctx.seed_project().await;
    block_current_version_updates(&ctx.db).await;

    let result = ctx
        .versions
        .create_json_edit_version(project.id, r#"{"objects":[]}"#)
        .await;
    assert_matches!(result, Err(AppError::Database(_)));

    assert_eq!(version::Entity::find().count(&ctx.db).await.unwrap(), 1);
    assert_eq!(ctx.current_version_id(project.id).await, Some(imported.id));
}

#[tokio::test]
async fn failed_import_removes_the_stored_blob() {
    let ctx = TestContext::new().await;
    let created = ctx.versions.create_project("Garage", None).await.unwrap();
    block_current_version_updates(&ctx.db).await;

    let result = ctx
        .versions
        .import_image(created.id, "garage.png", png_bytes(4, 4, 0), None)
        .await;
    assert!(result.is_err());

    assert!(ctx.blobs.paths().is_empty());
    assert_eq!(image_asset::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(version::Entity::find().count(&ctx.db).await.unwrap(), 0);
}
