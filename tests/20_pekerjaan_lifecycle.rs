mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use alumni_api::config::DenialPolicy;
use common::TestApp;

fn ids(body: &serde_json::Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn soft_delete_moves_job_to_trash_and_restore_brings_it_back() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;

    let (status, body) = app.send(Method::DELETE, &format!("/api/pekerjaan/{}", job), Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, list) = app.get("/api/pekerjaan", &app.alice_token).await?;
    assert!(ids(&list).is_empty());
    assert_eq!(list["count"], json!(0));

    let (status, _) = app.get(&format!("/api/pekerjaan/{}", job), &app.alice_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, trash) = app.get("/api/pekerjaan/trash", &app.alice_token).await?;
    assert_eq!(ids(&trash), vec![job]);
    assert!(trash["data"][0]["deleted_at"].is_string());

    let (status, restored) = app.send(Method::PUT, &format!("/api/pekerjaan/restore/{}", job), Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(restored["data"].get("deleted_at").is_none());

    let (_, list) = app.get("/api/pekerjaan", &app.alice_token).await?;
    assert_eq!(ids(&list), vec![job]);
    let (_, trash) = app.get("/api/pekerjaan/trash", &app.alice_token).await?;
    assert!(ids(&trash).is_empty());
    Ok(())
}

#[tokio::test]
async fn soft_deleting_twice_is_not_found() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;
    let uri = format!("/api/pekerjaan/{}", job);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.send(Method::DELETE, &uri, Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn hard_delete_only_from_trash() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;
    let purge = format!("/api/pekerjaan/hard-delete/{}", job);

    let (status, _) = app.send(Method::DELETE, &purge, Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.send(Method::DELETE, &format!("/api/pekerjaan/{}", job), Some(&app.alice_token), None).await?;
    let (status, _) = app.send(Method::DELETE, &purge, Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, trash) = app.get("/api/pekerjaan/trash", &app.alice_token).await?;
    assert!(ids(&trash).is_empty());
    let (status, _) = app.send(Method::POST, &format!("/api/pekerjaan/restore/{}", job), Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_see_or_touch_records() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;
    let uri = format!("/api/pekerjaan/{}", job);

    let (_, list) = app.get("/api/pekerjaan", &app.bob_token).await?;
    assert!(ids(&list).is_empty());

    let (status, _) = app.get(&uri, &app.bob_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send(Method::PUT, &uri, Some(&app.bob_token), Some(json!({"nama_perusahaan": "Hijacked"})))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&app.bob_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice's record is untouched
    let (status, body) = app.get(&uri, &app.alice_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nama_perusahaan"], json!("PT Satu"));

    // Admin sees and manages everything
    let (_, list) = app.get("/api/pekerjaan", &app.admin_token).await?;
    assert_eq!(ids(&list), vec![job]);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, trash) = app.get("/api/pekerjaan/trash", &app.bob_token).await?;
    assert!(ids(&trash).is_empty());
    let (status, _) = app.send(Method::PUT, &format!("/api/pekerjaan/restore/{}", job), Some(&app.bob_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn forbidden_policy_reports_403_for_foreign_records() -> Result<()> {
    let app = TestApp::with_denial(DenialPolicy::Forbidden).await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;

    let (status, body) = app.send(Method::DELETE, &format!("/api/pekerjaan/{}", job), Some(&app.bob_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));
    Ok(())
}

#[tokio::test]
async fn created_by_is_forced_to_the_caller() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/pekerjaan",
            Some(&app.alice_token),
            Some(json!({
                "alumni_id": alumni,
                "nama_perusahaan": "PT Dua",
                "posisi_jabatan": "QA",
                "tanggal_mulai_kerja": "2021-02-01",
                "status_pekerjaan": "aktif",
                "created_by": app.bob_id,
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created_by"], json!(app.alice_id));
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_400() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/pekerjaan",
            Some(&app.alice_token),
            Some(json!({
                "alumni_id": alumni,
                "nama_perusahaan": "PT Tiga",
                "posisi_jabatan": "Dev",
                "tanggal_mulai_kerja": "2022-06-01",
                "tanggal_selesai_kerja": "2021-06-01",
                "status_pekerjaan": "selesai",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["tanggal_selesai_kerja"].is_string());

    let (status, body) = app.get("/api/pekerjaan/abc", &app.alice_token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    Ok(())
}

#[tokio::test]
async fn update_changes_fields_and_keeps_the_rest() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    let job = app.create_job(&app.alice_token, alumni, "PT Satu", "2020-01-15").await?;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/pekerjaan/{}", job),
            Some(&app.alice_token),
            Some(json!({"posisi_jabatan": "Lead Engineer", "tanggal_selesai_kerja": "2023-01-31", "status_pekerjaan": "selesai"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["posisi_jabatan"], json!("Lead Engineer"));
    assert_eq!(body["data"]["nama_perusahaan"], json!("PT Satu"));
    assert_eq!(body["data"]["tanggal_selesai_kerja"], json!("2023-01-31"));
    Ok(())
}

#[tokio::test]
async fn jobs_by_alumni_is_admin_only() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "1001", "Alice Alumni").await?;
    app.create_job(&app.alice_token, alumni, "PT Satu", "2018-01-15").await?;
    app.create_job(&app.alice_token, alumni, "PT Dua", "2021-03-01").await?;
    let uri = format!("/api/pekerjaan/alumni/{}", alumni);

    let (status, body) = app.get(&uri, &app.alice_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));

    let (status, body) = app.get(&uri, &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["data"][0]["nama_perusahaan"], json!("PT Dua"));
    Ok(())
}
