#[cfg(test)]
mod tests {
    use crate::api::Created;
    use crate::auth::ACTOR_HEADER;
    use crate::models::{IssuedBookView, LeaveReport, LeaveStatus};
    use crate::test::test_utils::{create_standard_test_db, setup_test_client};
    use crate::validation::ValidationResponse;
    use rocket::http::{ContentType, Header, Status};
    use serde_json::{Value, json};

    fn actor(id: i64) -> Header<'static> {
        Header::new(ACTOR_HEADER, id.to_string())
    }

    #[rocket::async_test]
    async fn test_health() {
        let (client, _) = setup_test_client(create_standard_test_db().await, "2023-05-01").await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }

    #[rocket::async_test]
    async fn test_actor_required() {
        let (client, _) = setup_test_client(create_standard_test_db().await, "2023-05-01").await;

        for endpoint in ["/api/me", "/api/courses", "/api/dashboard", "/api/leave"] {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require an actor",
                endpoint
            );

            let body: ValidationResponse = response.into_json().await.unwrap();
            assert!(body.errors.contains_key("authentication"));
        }

        let response = client.get("/api/me").header(actor(999)).dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_role_gates() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let alice = test_db.user_id("alice");

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .header(actor(alice))
            .body(json!({ "name": "Law" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("admin")))
            .body(json!({ "name": "Law" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let created: Created = response.into_json().await.unwrap();
        assert!(created.id > 0);

        let response = client
            .post("/api/leave")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("admin")))
            .body(json!({ "date": "2023-06-10", "message": "Holiday" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_staff_only_marks_own_subjects() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let body = json!({
            "subject_id": test_db.subject_id("Math"),
            "session_id": test_db.session_id("2023"),
            "date": "2023-05-01",
            "present_student_ids": [test_db.user_id("alice")],
        })
        .to_string();

        let response = client
            .post("/api/attendance")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("ben")))
            .body(body.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .post("/api/attendance")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("ann")))
            .body(body.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let created: Created = response.into_json().await.unwrap();

        let response = client
            .post("/api/attendance")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("ann")))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);

        let response = client
            .get(format!("/api/attendance/{}", created.id))
            .header(actor(test_db.user_id("ann")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let entries: Value = response.into_json().await.unwrap();
        assert_eq!(entries.as_array().map(|a| a.len()), Some(2));

        let response = client
            .put(format!("/api/attendance/{}", created.id))
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("ann")))
            .body(json!({ "changes": [{ "student_id": 999, "status": true }] }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        let error: ValidationResponse = response.into_json().await.unwrap();
        assert_eq!(error.status, "error");
    }

    #[rocket::async_test]
    async fn test_leave_over_http() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let alice = actor(test_db.user_id("alice"));
        let admin = test_db.user_id("admin");

        let response = client
            .post("/api/leave")
            .header(ContentType::JSON)
            .header(alice.clone())
            .body(json!({ "date": "2023-06-10", "message": "Test leave" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let created: Created = response.into_json().await.unwrap();

        let response = client
            .put(format!("/api/leave/{}", created.id))
            .header(ContentType::JSON)
            .header(actor(admin))
            .body(json!({ "decision": "approve" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let leave: LeaveReport = response.into_json().await.unwrap();
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert_eq!(leave.status_label, "Approved");

        let response = client
            .put(format!("/api/leave/{}", created.id))
            .header(ContentType::JSON)
            .header(actor(admin))
            .body(json!({ "decision": "reject" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);

        let response = client.get("/api/leave").header(alice).dispatch().await;
        let history: Vec<LeaveReport> = response.into_json().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status_label, "Approved");

        let response = client
            .get("/api/leave/review?role=admin")
            .header(actor(admin))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_session_validation_over_http() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;

        let response = client
            .post("/api/sessions")
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("admin")))
            .body(json!({ "start_date": "2023-12-31", "end_date": "2023-01-01" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let error: ValidationResponse = response.into_json().await.unwrap();
        assert!(error.errors.contains_key("start_date"));
    }

    #[rocket::async_test]
    async fn test_issued_books_show_fines() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-15").await;
        let ann = test_db.user_id("ann");

        let response = client
            .post("/api/books")
            .header(ContentType::JSON)
            .header(actor(ann))
            .body(
                json!({
                    "name": "Dune",
                    "author": "Frank Herbert",
                    "isbn": "441013597",
                    "category": "Fiction",
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        sqlx::query(
            "INSERT INTO issued_books (student_id, isbn, issued_date, expiry_date)
             VALUES (?, '441013597', '2023-03-31', '2023-04-30')",
        )
        .bind(test_db.user_id("alice"))
        .execute(&test_db.pool)
        .await
        .unwrap();

        let response = client
            .get("/api/books/issued")
            .header(actor(test_db.user_id("alice")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let issued: Vec<IssuedBookView> = response.into_json().await.unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].fine, 75);

        let response = client
            .get("/api/books/issued")
            .header(actor(test_db.user_id("bob")))
            .dispatch()
            .await;
        let issued: Vec<IssuedBookView> = response.into_json().await.unwrap();
        assert!(issued.is_empty());
    }

    #[rocket::async_test]
    async fn test_dashboard_by_role() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;

        let response = client
            .get("/api/dashboard")
            .header(actor(test_db.user_id("admin")))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["role"], "admin");
        assert_eq!(body["total_students"], 3);

        let response = client
            .get("/api/dashboard")
            .header(actor(test_db.user_id("carl")))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["role"], "student");
        assert_eq!(body["overall"]["percent_present"], 0);
    }

    #[rocket::async_test]
    async fn test_staff_overall_attendance_limited_to_their_courses() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let alice = test_db.user_id("alice");
        let overall = format!("/api/students/{}/attendance", alice);

        let response = client
            .get(overall.as_str())
            .header(actor(test_db.user_id("ben")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        for reader in ["ann", "admin"] {
            let response = client
                .get(overall.as_str())
                .header(actor(test_db.user_id(reader)))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Ok, "{} could not read", reader);
        }

        let response = client
            .get(format!("/api/students/{}/attendance", test_db.user_id("carl")))
            .header(actor(test_db.user_id("ben")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .get(format!(
                "/api/students/{}/attendance?subject_id={}",
                alice,
                test_db.subject_id("Math")
            ))
            .header(actor(test_db.user_id("ben")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_my_attendance_for_date_range() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let math = test_db.subject_id("Math");

        for (day, present) in [("2023-05-01", true), ("2023-05-02", false), ("2023-06-01", true)] {
            let present_ids: Vec<i64> = if present { vec![test_db.user_id("alice")] } else { Vec::new() };
            let response = client
                .post("/api/attendance")
                .header(ContentType::JSON)
                .header(actor(test_db.user_id("ann")))
                .body(
                    json!({
                        "subject_id": math,
                        "session_id": test_db.session_id("2023"),
                        "date": day,
                        "present_student_ids": present_ids,
                    })
                    .to_string(),
                )
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Ok);
        }

        let range = format!(
            "/api/attendance/mine/range?subject_id={}&start_date=2023-05-01&end_date=2023-05-31",
            math
        );
        let response = client
            .get(range.as_str())
            .header(actor(test_db.user_id("alice")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let days: Value = response.into_json().await.unwrap();
        assert_eq!(
            days,
            json!([
                { "date": "2023-05-01", "status": true },
                { "date": "2023-05-02", "status": false },
            ])
        );

        let response = client
            .get(range.as_str())
            .header(actor(test_db.user_id("ann")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .get(format!(
                "/api/attendance/mine/range?subject_id={}&start_date=May&end_date=2023-05-31",
                math
            ))
            .header(actor(test_db.user_id("alice")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let error: ValidationResponse = response.into_json().await.unwrap();
        assert!(error.errors.contains_key("start_date"));
    }

    #[rocket::async_test]
    async fn test_account_management_over_http() {
        let (client, test_db) =
            setup_test_client(create_standard_test_db().await, "2023-05-01").await;
        let admin = test_db.user_id("admin");
        let bob = test_db.user_id("bob");
        let update = json!({
            "email": "robert@college.test",
            "first_name": "Robert",
            "last_name": "Tester",
            "gender": "M",
            "course_id": test_db.course_id("Computer Science"),
            "session_id": test_db.session_id("2023"),
        })
        .to_string();

        let response = client
            .put(format!("/api/users/{}", bob))
            .header(ContentType::JSON)
            .header(actor(test_db.user_id("ann")))
            .body(update.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .put(format!("/api/users/{}", bob))
            .header(ContentType::JSON)
            .header(actor(admin))
            .body(update)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .put("/api/me")
            .header(ContentType::JSON)
            .header(actor(bob))
            .body(
                json!({ "first_name": "Bobby", "last_name": "Tester", "gender": "M", "address": "9 Pine" })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/me").header(actor(bob)).dispatch().await;
        let me: Value = response.into_json().await.unwrap();
        assert_eq!(me["email"], "robert@college.test");
        assert_eq!(me["first_name"], "Bobby");
        assert_eq!(me["address"], "9 Pine");

        let response = client
            .put(format!("/api/subjects/{}", test_db.subject_id("Algorithms")))
            .header(ContentType::JSON)
            .header(actor(admin))
            .body(
                json!({
                    "name": "Data Structures",
                    "course_id": test_db.course_id("Computer Science"),
                    "staff_id": test_db.user_id("ann"),
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let carl = format!("/api/users/{}", test_db.user_id("carl"));
        let response = client.delete(carl.as_str()).header(actor(admin)).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);
        let response = client.delete(carl.as_str()).header(actor(admin)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
