//! Single-file upload integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use courseshelf_core::store::{InMemoryObjectStore, ObjectStore};

    use crate::{BOUNDARY, start_memory_server, start_server, upload};

    #[tokio::test]
    async fn test_should_upload_with_sanitized_name_under_course_folder() {
        let (server, store) = start_memory_server().await;

        let resp = upload(&server, "cii-2750", "Tárea 1.pdf", b"%PDF-1.4").await;
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["mensaje"], "Archivo subido correctamente");
        assert_eq!(json["data"]["name"], "eii/CII-2750/Tarea-1.pdf");
        assert!(json["data"]["url"].is_null());

        let stored = store.get("eii/CII-2750/Tarea-1.pdf").await.expect("stored");
        assert_eq!(stored.as_ref(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_should_return_public_url_when_configured() {
        let store = Arc::new(InMemoryObjectStore::new());
        let server = start_server(store, Some("https://cdn.example.com/recursos/")).await;

        let resp = upload(&server, "cit-1000", "guia.pdf", b"x").await;
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["data"]["name"], "plan-comun/CIT-1000/guia.pdf");
        assert_eq!(
            json["data"]["url"],
            "https://cdn.example.com/recursos/plan-comun/CIT-1000/guia.pdf"
        );
    }

    #[tokio::test]
    async fn test_should_reject_empty_file() {
        let (server, store) = start_memory_server().await;

        let resp = upload(&server, "cii-2750", "vacio.pdf", b"").await;
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["error"], "No se envió archivo");
        assert_eq!(json["code"], "EmptyUpload");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_report_missing_file_for_non_multipart_upload() {
        let (server, store) = start_memory_server().await;

        let resp = server
            .client
            .post(server.url("/resources/cii-2750"))
            .header("content-type", "application/json")
            .body("{}")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["error"], "No se envió archivo");

        let resp = server
            .client
            .post(server.url("/resources/cii-2750"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 400);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_upload_through_spanish_alias() {
        let (server, store) = start_memory_server().await;

        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"archivo\"; filename=\"Año Ñandú.docx\"\r\n\r\n\
             contenido\r\n--{BOUNDARY}--\r\n"
        );
        let resp = server
            .client
            .post(server.url("/recursos/Apuntes/2024"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert!(store.contains("Apuntes/2024/Ano-Nandu.docx"));
    }

    #[tokio::test]
    async fn test_should_carry_common_headers() {
        let (server, _store) = start_memory_server().await;

        let resp = upload(&server, "cii-2750", "a.pdf", b"x").await;
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }
}
