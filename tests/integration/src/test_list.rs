//! Listing integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use courseshelf_core::store::ObjectStore;

    use crate::start_memory_server;

    async fn seed(store: &impl ObjectStore, keys: &[&str]) {
        for key in keys {
            store
                .put(key, Bytes::from_static(b"x"), "application/pdf")
                .await
                .unwrap_or_else(|e| panic!("put {key}: {e}"));
        }
    }

    fn names(json: &serde_json::Value) -> Vec<String> {
        json.as_array()
            .expect("array body")
            .iter()
            .map(|e| e["name"].as_str().expect("name").to_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_should_list_direct_children_in_collation_order() {
        let (server, store) = start_memory_server().await;
        seed(
            store.as_ref(),
            &[
                "eii/CII-2750/zeta.pdf",
                "eii/CII-2750/Árbol.pdf",
                "eii/CII-2750/beta.pdf",
                "eii/CII-2750/sub/deep.pdf",
                "eii/CII-2751/other.pdf",
            ],
        )
        .await;

        let resp = server
            .client
            .get(server.url("/resources/eii/CII-2750"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(names(&json), ["Árbol.pdf", "beta.pdf", "zeta.pdf"]);
        assert_eq!(json[0]["path"], "eii/CII-2750/Árbol.pdf");
        assert_eq!(json[0]["size"], 1);
        assert!(json[0]["lastModified"].is_string());
    }

    #[tokio::test]
    async fn test_should_list_course_by_code() {
        let (server, store) = start_memory_server().await;
        seed(store.as_ref(), &["eii/CII-2750/a.pdf"]).await;

        let json: serde_json::Value = server
            .client
            .get(server.url("/recursos/cii-2750"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json body");
        assert_eq!(names(&json), ["a.pdf"]);
    }

    #[tokio::test]
    async fn test_should_page_with_limit_and_offset() {
        let (server, store) = start_memory_server().await;
        seed(
            store.as_ref(),
            &["docs/a.txt", "docs/b.txt", "docs/c.txt", "docs/d.txt"],
        )
        .await;

        let json: serde_json::Value = server
            .client
            .get(server.url("/resources/docs?limit=2&offset=1"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json body");
        assert_eq!(names(&json), ["b.txt", "c.txt"]);

        let json: serde_json::Value = server
            .client
            .get(server.url("/resources/docs?offset=10"))
            .send()
            .await
            .expect("list")
            .json()
            .await
            .expect("json body");
        assert!(names(&json).is_empty());
    }

    #[tokio::test]
    async fn test_should_return_empty_list_for_unknown_folder() {
        let (server, _store) = start_memory_server().await;

        let resp = server
            .client
            .get(server.url("/resources/coc-9999"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_should_reject_invalid_limit() {
        let (server, _store) = start_memory_server().await;

        let resp = server
            .client
            .get(server.url("/resources/docs?limit=-5"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["code"], "InvalidParameter");
    }

    #[tokio::test]
    async fn test_should_report_store_failure_as_server_error() {
        let (server, store) = start_memory_server().await;
        store.fail_on(
            courseshelf_core::store::StoreOperation::List,
            "connection refused",
        );

        let resp = server
            .client
            .get(server.url("/resources/docs"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), 500);
        let json: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(json["detalle"], "connection refused");
    }
}
