//! Integration tests for the people directory and the search endpoint
//!
//! Covers:
//! - GET /people
//! - GET /search

mod common;

#[cfg(test)]
mod directory_tests {
    use super::common::*;
    use serde_json::Value;
    use sqlx::SqlitePool;

    // ============================================================
    // GET /people
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events", "bills")))]
    async fn test_people_totals(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/people")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let people = body["people"].as_array().unwrap();

        let ids: Vec<&str> = people.iter().map(|p| p["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["user-alice", "user-bob", "user-charlie"]);

        let alice = &people[0];
        assert_eq!(alice["event_count"], 1);
        assert_eq!(alice["total_spent"], 2001);
        assert_eq!(alice["total_owed"], 4000);

        let bob = &people[1];
        assert_eq!(bob["event_count"], 1);
        assert_eq!(bob["total_spent"], 10000);
        assert_eq!(bob["total_owed"], 4001);
        assert_eq!(bob["image"], "https://img.example.com/bob.png");

        let charlie = &people[2];
        assert_eq!(charlie["total_spent"], 0);
        assert_eq!(charlie["total_owed"], 4000);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_people_empty_without_invitations(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/people")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["people"].as_array().unwrap().is_empty());
        Ok(())
    }

    // ============================================================
    // GET /search
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_short_query_returns_nothing(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/search")
            .add_query_param("q", "b")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["results"].as_array().unwrap().is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_search_finds_events(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/search")
            .add_query_param("q", "Biryani")
            .authorization_bearer(token_for("bob"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["type"], "event");
        assert_eq!(results[0]["id"], 1);
        assert_eq!(results[0]["title"], "Team dinner");
        assert_eq!(results[0]["subtitle"], "Alice");
        assert_eq!(results[0]["href"], "/events/1");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_search_finds_people(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/search")
            .add_query_param("q", "bob")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["type"], "person");
        assert_eq!(results[0]["id"], "user-bob");
        assert_eq!(results[0]["title"], "Bob");
        assert_eq!(results[0]["subtitle"], "bob@example.com");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_search_matches_email_domain(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/search")
            .add_query_param("q", "example.com")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let people: Vec<&Value> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|r| r["type"] == "person")
            .collect();
        assert_eq!(people.len(), 4);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_search_wildcards_match_literally(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        for query in ["%%", "__", "%_%"] {
            let response = server
                .get("/search")
                .add_query_param("q", query)
                .authorization_bearer(token.clone())
                .await;

            response.assert_status_ok();
            let body: Value = response.json();
            assert!(body["results"].as_array().unwrap().is_empty(), "query {query}");
        }
        Ok(())
    }
}
