//! Delete integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use courseshelf_core::store::{ObjectStore, StoreOperation};
    use serde_json::json;

    use crate::{TestServer, start_memory_server};

    async fn delete(server: &TestServer, path: &str, body: &serde_json::Value) -> reqwest::Response {
        server
            .client
            .delete(server.url(path))
            .json(body)
            .send()
            .await
            .expect("delete request")
    }

    #[tokio::test]
    async fn test_should_delete_course_file() {
        let (server, store) = start_memory_server().await;
        store
            .put("eii/CII-2750/a.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .expect("seed");
        store
            .put("eii/CII-2750/b.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .expect("seed");

        let resp = delete(
            &server,
            "/resources/delete",
            &json!({"curso": "CII-2750", "nombreArchivo": "a.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["mensaje"], "Archivo eliminado correctamente");
        assert_eq!(body["data"]["name"], "eii/CII-2750/a.pdf");
        assert!(!store.contains("eii/CII-2750/a.pdf"));
        assert!(store.contains("eii/CII-2750/b.pdf"));
    }

    #[tokio::test]
    async fn test_should_succeed_for_absent_file() {
        let (server, _store) = start_memory_server().await;

        let resp = delete(
            &server,
            "/recursos/eliminar",
            &json!({"curso": "cii-2750", "nombreArchivo": "nunca.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_require_file_name() {
        let (server, _store) = start_memory_server().await;

        let resp = delete(&server, "/resources/delete", &json!({"curso": "cii-2750"})).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "Faltan parámetros: nombreArchivo es requerido");
    }

    #[tokio::test]
    async fn test_should_surface_store_failure() {
        let (server, store) = start_memory_server().await;
        store.fail_on(StoreOperation::Delete, "503 SlowDown");

        let resp = delete(
            &server,
            "/resources/delete",
            &json!({"curso": "cii-2750", "nombreArchivo": "a.pdf"}),
        )
        .await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["code"], "StoreUnavailable");
        assert_eq!(body["detalle"], "503 SlowDown");
    }

    #[tokio::test]
    async fn test_should_reject_wrong_method_on_fixed_route() {
        let (server, _store) = start_memory_server().await;

        let resp = server
            .client
            .put(server.url("/resources/delete"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 405);
    }
}
