//! Rename integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use courseshelf_core::store::{ObjectStore, StoreOperation};
    use serde_json::json;

    use crate::{TestServer, start_memory_server};

    async fn rename(server: &TestServer, body: &serde_json::Value) -> reqwest::Response {
        server
            .client
            .patch(server.url("/resources/rename"))
            .json(body)
            .send()
            .await
            .expect("rename request")
    }

    #[tokio::test]
    async fn test_should_rename_within_course_folder() {
        let (server, store) = start_memory_server().await;
        store
            .put("eii/CII-2750/a.pdf", Bytes::from_static(b"pdf"), "application/pdf")
            .await
            .expect("seed");

        let resp = rename(
            &server,
            &json!({"curso": "cii-2750", "nombreActual": "a.pdf", "nombreNuevo": "Tarea-1.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["mensaje"], "Archivo renombrado correctamente");
        assert_eq!(body["data"]["name"], "eii/CII-2750/Tarea-1.pdf");

        assert!(!store.contains("eii/CII-2750/a.pdf"));
        let moved = store.get("eii/CII-2750/Tarea-1.pdf").await.expect("moved");
        assert_eq!(moved.as_ref(), b"pdf");
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_missing_source() {
        let (server, store) = start_memory_server().await;

        let resp = rename(
            &server,
            &json!({"curso": "cii-2750", "nombreActual": "nada.pdf", "nombreNuevo": "b.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["code"], "NotFound");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_require_every_parameter() {
        let (server, _store) = start_memory_server().await;

        let resp = rename(&server, &json!({"curso": "cii-2750", "nombreActual": "a.pdf"})).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["code"], "MissingParameter");
        assert_eq!(body["error"], "Faltan parámetros: nombreNuevo es requerido");
    }

    #[tokio::test]
    async fn test_should_reject_name_escaping_course_folder() {
        let (server, _store) = start_memory_server().await;

        let resp = rename(
            &server,
            &json!({"curso": "cii-2750", "nombreActual": "a.pdf", "nombreNuevo": "../b.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["code"], "InvalidName");
    }

    #[tokio::test]
    async fn test_should_keep_original_when_copy_fails() {
        let (server, store) = start_memory_server().await;
        store
            .put("eii/CII-2750/a.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .expect("seed");
        store.fail_on(StoreOperation::Copy, "AccessDenied");

        let resp = rename(
            &server,
            &json!({"curso": "cii-2750", "nombreActual": "a.pdf", "nombreNuevo": "b.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "No se pudo subir el archivo con el nuevo nombre");
        assert!(store.contains("eii/CII-2750/a.pdf"));
        assert!(!store.contains("eii/CII-2750/b.pdf"));
    }

    #[tokio::test]
    async fn test_should_report_partial_rename_when_delete_fails() {
        let (server, store) = start_memory_server().await;
        store
            .put("eii/CII-2750/a.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .expect("seed");
        store.fail_on(StoreOperation::Delete, "AccessDenied");

        let resp = server
            .client
            .patch(server.url("/recursos/renombrar"))
            .json(&json!({"curso": "cii-2750", "nombreActual": "a.pdf", "nombreNuevo": "b.pdf"}))
            .send()
            .await
            .expect("rename request");
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["code"], "RenamedButOriginalNotRemoved");
        assert_eq!(
            body["error"],
            "Archivo renombrado, pero no se pudo eliminar el original"
        );
        assert!(store.contains("eii/CII-2750/a.pdf"));
        assert!(store.contains("eii/CII-2750/b.pdf"));
    }
}
