mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn alumni_crud_round_trip() -> Result<()> {
    let app = TestApp::new().await?;
    let id = app.create_alumni(&app.alice_token, "2017001", "Siti Rahma").await?;
    let uri = format!("/api/alumni/{}", id);

    let (status, body) = app.get(&uri, &app.alice_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nim"], json!("2017001"));
    assert_eq!(body["data"]["created_by"], json!(app.alice_id));

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&app.alice_token), Some(json!({"alamat": "Jl. Sudirman 5", "tahun_lulus": 2022})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alamat"], json!("Jl. Sudirman 5"));
    assert_eq!(body["data"]["tahun_lulus"], json!(2022));
    assert_eq!(body["data"]["nama"], json!("Siti Rahma"));

    let (status, _) = app.send(Method::DELETE, &uri, Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, &app.alice_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, trash) = app.get("/api/alumni/trash", &app.alice_token).await?;
    assert_eq!(trash["count"], json!(1));

    let (status, body) = app.send(Method::PUT, &format!("/api/alumni/restore/{}", id), Some(&app.alice_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
    let (status, _) = app.get(&uri, &app.alice_token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn missing_required_fields_are_reported_per_field() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app
        .send(Method::POST, "/api/alumni", Some(&app.alice_token), Some(json!({"nim": "1", "email": "not-an-email"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    for field in ["nama", "jurusan", "email"] {
        assert!(body["field_errors"][field].is_string(), "{}", field);
    }
    Ok(())
}

#[tokio::test]
async fn alumni_are_scoped_to_their_creator() -> Result<()> {
    let app = TestApp::new().await?;
    let alice_alumni = app.create_alumni(&app.alice_token, "A1", "Ani").await?;
    app.create_alumni(&app.bob_token, "B1", "Bayu").await?;

    let (_, body) = app.get("/api/alumni", &app.alice_token).await?;
    assert_eq!(body["meta"]["total"], json!(1));
    assert_eq!(body["data"][0]["nim"], json!("A1"));

    let (status, _) = app.get(&format!("/api/alumni/{}", alice_alumni), &app.bob_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &format!("/api/alumni/{}", alice_alumni), Some(&app.bob_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/alumni", &app.admin_token).await?;
    assert_eq!(body["meta"]["total"], json!(2));
    Ok(())
}

#[tokio::test]
async fn jobs_cannot_reference_trashed_alumni() -> Result<()> {
    let app = TestApp::new().await?;
    let alumni = app.create_alumni(&app.alice_token, "A1", "Ani").await?;
    app.send(Method::DELETE, &format!("/api/alumni/{}", alumni), Some(&app.alice_token), None).await?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/pekerjaan",
            Some(&app.alice_token),
            Some(json!({
                "alumni_id": alumni,
                "nama_perusahaan": "PT Satu",
                "posisi_jabatan": "Dev",
                "tanggal_mulai_kerja": "2020-01-01",
                "status_pekerjaan": "aktif",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["alumni_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn duplicate_nim_is_rejected_across_owners() -> Result<()> {
    let app = TestApp::new().await?;
    app.create_alumni(&app.alice_token, "2017001", "Siti Rahma").await?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/alumni",
            Some(&app.bob_token),
            Some(json!({
                "nim": "2017001",
                "nama": "Sari Dewi",
                "jurusan": "Sistem Informasi",
                "email": "sari@example.com",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["nim"].is_string());

    let (_, body) = app.get("/api/alumni", &app.admin_token).await?;
    assert_eq!(body["meta"]["total"], json!(1));
    Ok(())
}

#[tokio::test]
async fn blank_update_fields_are_reported_per_field() -> Result<()> {
    let app = TestApp::new().await?;
    let id = app.create_alumni(&app.alice_token, "A1", "Ani").await?;

    let (status, body) = app
        .send(Method::PUT, &format!("/api/alumni/{}", id), Some(&app.alice_token), Some(json!({"nama": "", "jurusan": " "})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["nama"].is_string());
    assert!(body["field_errors"]["jurusan"].is_string());
    Ok(())
}
