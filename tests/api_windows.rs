//! Integration tests for WIP windows and organisation settings
//!
//! Covers:
//! - GET /wip-windows
//! - POST /wip-windows
//! - PATCH /wip-windows/{window_id}
//! - DELETE /wip-windows/{window_id}
//! - GET /settings

mod common;

#[cfg(test)]
mod window_tests {
    use super::common::*;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    // ============================================================
    // GET /wip-windows
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_list_windows_with_stats(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/wip-windows")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let windows = body["wip_windows"].as_array().unwrap();
        let ids: Vec<i64> = windows
            .iter()
            .map(|w| w["wip_window_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(windows[0]["name"], "Spring 2025");
        assert_eq!(windows[0]["is_active"], true);
        assert_eq!(windows[0]["event_count"], 2);
        assert_eq!(windows[0]["participant_count"], 3);
        assert_eq!(windows[1]["event_count"], 0);
        assert_eq!(windows[2]["event_count"], 1);
        Ok(())
    }

    // ============================================================
    // POST /wip-windows
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_create_active_window_becomes_current(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        let response = server
            .post("/wip-windows")
            .authorization_bearer(token.clone())
            .json(&json!({
                "name": "  Summer 2025  ",
                "start_date": "2025-06-01T00:00:00Z",
                "end_date": "2025-06-30T00:00:00Z",
                "is_active": true
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["name"], "Summer 2025");
        assert_eq!(created["is_active"], true);
        let new_id = created["wip_window_id"].as_i64().unwrap();

        let settings: Value = server
            .get("/settings")
            .authorization_bearer(token.clone())
            .await
            .json();
        assert_eq!(settings["current_wip_window_id"], new_id);
        assert_eq!(settings["current_wip_window"]["name"], "Summer 2025");

        let list: Value = server
            .get("/wip-windows")
            .authorization_bearer(token)
            .await
            .json();
        let active: Vec<&Value> = list["wip_windows"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|w| w["is_active"] == true)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["wip_window_id"], new_id);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_create_window_rejects_reversed_range(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/wip-windows")
            .authorization_bearer(token_for("alice"))
            .json(&json!({
                "name": "Backwards",
                "start_date": "2025-06-30T00:00:00Z",
                "end_date": "2025-06-01T00:00:00Z"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation error");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_create_window_rejects_blank_name(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        let response = server
            .post("/wip-windows")
            .authorization_bearer(token.clone())
            .json(&json!({
                "name": "  ",
                "start_date": "2025-06-01T00:00:00Z",
                "end_date": "2025-06-30T00:00:00Z"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation error");

        let response = server
            .patch("/wip-windows/2")
            .authorization_bearer(token)
            .json(&json!({ "name": "   " }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_create_window_rejects_missing_fields(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/wip-windows")
            .authorization_bearer(token_for("alice"))
            .json(&json!({ "name": "No dates" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
        Ok(())
    }

    // ============================================================
    // PATCH /wip-windows/{window_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_activate_window_switches_current(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("bob");

        let response = server
            .patch("/wip-windows/2")
            .authorization_bearer(token.clone())
            .json(&json!({ "is_active": true }))
            .await;

        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["is_active"], true);

        let settings: Value = server
            .get("/settings")
            .authorization_bearer(token)
            .await
            .json();
        assert_eq!(settings["current_wip_window_id"], 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_deactivate_current_window_clears_settings(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        server
            .patch("/wip-windows/1")
            .authorization_bearer(token.clone())
            .json(&json!({ "is_active": false }))
            .await
            .assert_status_ok();

        let settings: Value = server
            .get("/settings")
            .authorization_bearer(token)
            .await
            .json();
        assert_eq!(settings["current_wip_window_id"], Value::Null);
        assert_eq!(settings["current_wip_window"], Value::Null);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_update_rejects_end_before_stored_start(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .patch("/wip-windows/1")
            .authorization_bearer(token_for("alice"))
            .json(&json!({ "end_date": "2025-02-01T00:00:00Z" }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_update_missing_window(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .patch("/wip-windows/999")
            .authorization_bearer(token_for("alice"))
            .json(&json!({ "name": "Ghost" }))
            .await;

        response.assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // DELETE /wip-windows/{window_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_delete_window_with_events_requires_force(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .delete("/wip-windows/3")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["event_count"], 1);
        assert_eq!(body["can_force_delete"], true);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows", "events")))]
    async fn test_force_delete_window_removes_events(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        let response = server
            .delete("/wip-windows/3")
            .add_query_param("force", "true")
            .authorization_bearer(token.clone())
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);

        server
            .get("/events/3")
            .authorization_bearer(token)
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_delete_active_window_is_refused(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .delete("/wip-windows/1")
            .authorization_bearer(token_for("alice"))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Cannot delete the active WIP window");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "windows")))]
    async fn test_delete_empty_inactive_window(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = token_for("alice");

        server
            .delete("/wip-windows/2")
            .authorization_bearer(token.clone())
            .await
            .assert_status_ok();

        server
            .delete("/wip-windows/2")
            .authorization_bearer(token)
            .await
            .assert_status_not_found();
        Ok(())
    }
}
