//! Bulk upload integration tests.

#[cfg(test)]
mod tests {
    use courseshelf_core::store::{ObjectStore, StoreOperation};
    use serde_json::json;

    use crate::{TestServer, start_memory_server};

    async fn bulk_upload(server: &TestServer, body: &serde_json::Value) -> reqwest::Response {
        server
            .client
            .post(server.url("/resources/bulk-upload"))
            .json(body)
            .send()
            .await
            .expect("bulk upload request")
    }

    fn course_folder(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, data) in files {
            std::fs::write(dir.path().join(name), data).expect("write fixture");
        }
        dir
    }

    #[tokio::test]
    async fn test_should_upload_every_file_in_name_order() {
        let (server, store) = start_memory_server().await;
        let dir = course_folder(&[("b.pdf", b"bb"), ("a.pdf", b"a"), ("c.txt", b"")]);
        std::fs::create_dir(dir.path().join("sub")).expect("subdir");

        let resp = bulk_upload(
            &server,
            &json!({"curso": "cii-2750", "carpeta": dir.path().to_str().expect("utf-8 path")}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["mensaje"], "Carga masiva finalizada");
        assert_eq!(body["exitosos"], 3);
        assert_eq!(body["fallidos"], 0);

        let archivos: Vec<&str> = body["resultados"]
            .as_array()
            .expect("resultados")
            .iter()
            .map(|r| r["archivo"].as_str().expect("archivo"))
            .collect();
        assert_eq!(archivos, ["a.pdf", "b.pdf", "c.txt"]);
        assert_eq!(body["resultados"][0]["data"]["name"], "eii/CII-2750/a.pdf");
        assert!(body["resultados"][0]["error"].is_null());

        let stored = store.get("eii/CII-2750/b.pdf").await.expect("stored");
        assert_eq!(stored.as_ref(), b"bb");
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_should_report_per_file_failures_and_continue() {
        let (server, store) = start_memory_server().await;
        let dir = course_folder(&[("a.pdf", b"a"), ("b.pdf", b"b"), ("c.pdf", b"c")]);
        store.fail_on_key(StoreOperation::Put, "eii/CII-2750/b.pdf", "AccessDenied");

        let resp = bulk_upload(
            &server,
            &json!({"curso": "cii-2750", "carpeta": dir.path().to_str().expect("utf-8 path")}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["exitosos"], 2);
        assert_eq!(body["fallidos"], 1);
        assert_eq!(body["resultados"][1]["archivo"], "b.pdf");
        assert!(body["resultados"][1]["data"].is_null());
        assert!(
            body["resultados"][1]["error"]
                .as_str()
                .expect("error text")
                .contains("AccessDenied")
        );
        assert!(store.contains("eii/CII-2750/a.pdf"));
        assert!(store.contains("eii/CII-2750/c.pdf"));
    }

    #[tokio::test]
    async fn test_should_reject_missing_folder() {
        let (server, store) = start_memory_server().await;

        let resp = bulk_upload(
            &server,
            &json!({"curso": "cii-2750", "carpeta": "/definitely/not/here"}),
        )
        .await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(
            body["error"],
            "La carpeta especificada no existe o no es un directorio"
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_require_folder_parameter() {
        let (server, _store) = start_memory_server().await;

        let resp = server
            .client
            .post(server.url("/recursos/subir-carpeta"))
            .json(&json!({"curso": "cii-2750"}))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "Faltan parámetros: carpeta es requerido");
    }

    #[tokio::test]
    async fn test_should_report_empty_folder() {
        let (server, store) = start_memory_server().await;
        let dir = tempfile::tempdir().expect("tempdir");

        let resp = bulk_upload(
            &server,
            &json!({"curso": "cii-2750", "carpeta": dir.path().to_str().expect("utf-8 path")}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["exitosos"], 0);
        assert_eq!(body["fallidos"], 0);
        assert_eq!(body["resultados"], json!([]));
        assert!(store.is_empty());
    }
}
