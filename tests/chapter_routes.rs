mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::TestApp;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn seed_manga(t: &TestApp, token: &str) -> String {
    let (status, body) = t
        .post(
            "/manga",
            Some(token),
            json!({"slug": "tower-of-god", "titleEn": "Tower of God", "coverUrl": "/uploads/cover.png"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn add_chapter(t: &TestApp, token: &str, manga_id: &str, number: f64) -> Value {
    let (status, body) = t
        .post(
            "/chapters",
            Some(token),
            json!({
                "mangaId": manga_id,
                "number": number,
                "title": format!("Chapter {number}"),
                "images": [{"url": "/uploads/p1.webp", "width": 800, "height": 1200}],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn reader_links_neighbours_by_number() {
    let t = TestApp::spawn("chapters-adjacent").await;
    let owner = t.owner_token().await;
    let manga_id = seed_manga(&t, &owner).await;

    let first = add_chapter(&t, &owner, &manga_id, 1.0).await;
    let middle = add_chapter(&t, &owner, &manga_id, 2.5).await;
    let last = add_chapter(&t, &owner, &manga_id, 3.0).await;

    let (status, body) = t
        .get(&format!("/chapters/{}", middle["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], 2.5);
    assert_eq!(body["images"][0]["width"], 800);
    assert_eq!(body["manga"]["slug"], "tower-of-god");
    assert_eq!(body["manga"]["titleEn"], "Tower of God");
    assert_eq!(body["prev"]["id"], first["id"]);
    assert_eq!(body["next"]["id"], last["id"]);

    let (_, body) = t
        .get(&format!("/chapters/{}", first["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(body["prev"], Value::Null);
    assert_eq!(body["next"]["number"], 2.5);

    let (status, _) = t
        .delete(&format!("/chapters/{}", middle["id"].as_str().unwrap()), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = t
        .get(&format!("/chapters/{}", last["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(body["prev"]["id"], first["id"]);
    assert_eq!(body["next"], Value::Null);

    let (status, _) = t.get("/chapters/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chapter_numbers_are_unique_per_manga() {
    let t = TestApp::spawn("chapters-unique").await;
    let owner = t.owner_token().await;
    let member = t.register("reader@example.com", "reader").await;
    let manga_id = seed_manga(&t, &owner).await;
    add_chapter(&t, &owner, &manga_id, 1.0).await;

    let (status, body) = t
        .post("/chapters", Some(&owner), json!({"mangaId": manga_id, "number": 1.0}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Chapter 1 already exists for this manga");

    let (status, _) = t
        .post("/chapters", Some(&owner), json!({"mangaId": "missing", "number": 1.0}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t
        .post("/chapters", Some(&owner), json!({"mangaId": manga_id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t
        .post("/chapters", Some(&member), json!({"mangaId": manga_id, "number": 2.0}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listings_page_chapters_newest_first() {
    let t = TestApp::spawn("chapters-list").await;
    let owner = t.owner_token().await;
    let manga_id = seed_manga(&t, &owner).await;
    for n in 1..=3 {
        add_chapter(&t, &owner, &manga_id, f64::from(n)).await;
    }

    let (status, body) = t
        .get(&format!("/chapters/manga/{manga_id}?limit=2"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"], json!({"total": 3, "page": 1, "limit": 2, "totalPages": 2}));
    assert_eq!(body["data"][0]["number"], 3.0);
    assert_eq!(body["data"][1]["number"], 2.0);

    let (_, latest) = t.get("/chapters/latest?limit=10", None).await;
    let latest = latest.as_array().unwrap();
    assert_eq!(latest.len(), 3);
    assert!(latest.iter().all(|c| c["manga"]["id"] == manga_id.as_str()));

    let (_, detail) = t.get("/manga/tower-of-god", None).await;
    assert_eq!(detail["chapters"].as_array().unwrap().len(), 3);
    assert_eq!(detail["chapters"][0]["number"], 3.0);
    let (_, list) = t.get("/manga", None).await;
    assert_eq!(list["data"][0]["chapterCount"], 3);

    let chapter_id = body["data"][0]["id"].as_str().unwrap().to_string();
    let (status, updated) = t
        .put(
            &format!("/chapters/{chapter_id}"),
            Some(&owner),
            json!({"title": "The Finale", "isLocked": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "The Finale");
    assert_eq!(updated["isLocked"], true);
    assert_eq!(updated["number"], 3.0);

    // Chapters go with their manga.
    let (status, _) = t.delete(&format!("/manga/{manga_id}"), Some(&owner)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&format!("/chapters/{chapter_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_stores_file_and_serves_it() {
    let t = TestApp::spawn("chapters-upload").await;
    let owner = t.owner_token().await;

    let boundary = "komik-test-boundary";
    let multipart = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"page 01.PNG\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fake-png-bytes\r\n\
         --{boundary}--\r\n"
    );
    let resp = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chapters/upload")
                .header(header::AUTHORIZATION, format!("Bearer {owner}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["originalName"], "page 01.PNG");
    assert_eq!(body["mimeType"], "image/png");
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with(".png"));
    assert_eq!(body["url"], format!("/uploads/{filename}"));

    let resp = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let served = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&served[..], b"fake-png-bytes");

    let (status, _) = t.post("/chapters/upload", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reading_a_chapter_bumps_its_views() {
    let t = TestApp::spawn("chapters-views").await;
    let owner = t.owner_token().await;
    let manga_id = seed_manga(&t, &owner).await;
    let chapter = add_chapter(&t, &owner, &manga_id, 1.0).await;
    assert_eq!(chapter["views"], 0);

    let uri = format!("/chapters/{}", chapter["id"].as_str().unwrap());
    for _ in 0..2 {
        let (status, _) = t.get(&uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let list_uri = format!("/chapters/manga/{manga_id}");
    let mut views = 0;
    for _ in 0..40 {
        let (_, list) = t.get(&list_uri, None).await;
        views = list["data"][0]["views"].as_i64().unwrap_or(0);
        if views >= 1 {
            break;
        }
        common::settle().await;
    }
    assert!((1..=2).contains(&views), "views = {views}");
}

#[tokio::test]
async fn malformed_query_uses_error_envelope() {
    let t = TestApp::spawn("chapters-bad-query").await;
    let (status, body) = t.get("/chapters/latest?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = t.get("/manga?page=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let owner = t.owner_token().await;
    let (status, body) = t
        .post("/chapters", Some(&owner), json!({"mangaId": "x", "number": "one"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
