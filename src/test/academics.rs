#[cfg(test)]
mod tests {
    use crate::auth::Role;
    use crate::db;
    use crate::error::AppError;
    use crate::test::test_utils::{TestDbBuilder, create_standard_test_db, date};
    use crate::validation::{CourseInput, NewUser, ProfileUpdate, SubjectInput, UserUpdate};
    use crate::workflows::academics::{
        create_course, create_session, create_subject, create_user, edit_session, edit_subject,
        edit_user, email_in_use, remove_course, remove_user, rename_course, update_profile,
    };
    use rocket::tokio;

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "secret".to_string(),
            first_name: "Dana".to_string(),
            last_name: "Scully".to_string(),
            role: role.to_string(),
            gender: "F".to_string(),
            address: "1 Main St".to_string(),
            course_id: None,
            session_id: None,
        }
    }

    fn user_update(email: &str) -> UserUpdate {
        UserUpdate {
            email: email.to_string(),
            password: None,
            first_name: "Alicia".to_string(),
            last_name: "Moreno".to_string(),
            gender: "F".to_string(),
            address: "12 Elm Rd".to_string(),
            course_id: None,
            session_id: None,
        }
    }

    async fn stored_hash(pool: &sqlx::Pool<sqlx::Sqlite>, id: i64) -> String {
        sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_must_start_before_it_ends() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        let err = create_session(&test_db.pool, date("2023-12-31"), date("2023-01-01"))
            .await
            .unwrap_err();
        match err {
            AppError::InvalidArgument(errors) => assert!(errors.has_field("start_date")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }

        let id = create_session(&test_db.pool, date("2023-01-01"), date("2023-12-31"))
            .await
            .unwrap();
        let session = db::get_session(&test_db.pool, id).await.unwrap();
        assert_eq!(session.to_string(), "From 2023-01-01 to 2023-12-31");

        assert!(matches!(
            create_session(&test_db.pool, date("2023-05-05"), date("2023-05-05")).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_edit_session_checks_order_too() {
        let test_db = create_standard_test_db().await;
        let id = test_db.session_id("2023");

        assert!(matches!(
            edit_session(&test_db.pool, id, date("2024-06-01"), date("2024-01-01")).await,
            Err(AppError::InvalidArgument(_))
        ));

        edit_session(&test_db.pool, id, date("2024-01-01"), date("2024-06-01"))
            .await
            .unwrap();
        let session = db::get_session(&test_db.pool, id).await.unwrap();
        assert_eq!(session.end_date, date("2024-06-01"));

        assert!(matches!(
            edit_session(&test_db.pool, 999, date("2024-01-01"), date("2024-06-01")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_course_lifecycle() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let input = CourseInput {
            name: " Physics ".to_string(),
        };

        let id = create_course(&test_db.pool, &input).await.unwrap();
        assert_eq!(db::get_course(&test_db.pool, id).await.unwrap().name, "Physics");

        rename_course(
            &test_db.pool,
            id,
            &CourseInput {
                name: "Applied Physics".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            db::get_course(&test_db.pool, id).await.unwrap().name,
            "Applied Physics"
        );

        assert!(matches!(
            create_course(&test_db.pool, &CourseInput { name: String::new() }).await,
            Err(AppError::InvalidArgument(_))
        ));

        remove_course(&test_db.pool, id).await.unwrap();
        assert!(matches!(
            remove_course(&test_db.pool, id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_subject_requires_staff_owner() {
        let test_db = create_standard_test_db().await;
        let course_id = test_db.course_id("Computer Science");

        let id = create_subject(
            &test_db.pool,
            &SubjectInput {
                name: "Databases".to_string(),
                course_id,
                staff_id: test_db.user_id("ann"),
            },
        )
        .await
        .unwrap();
        let subject = db::get_subject(&test_db.pool, id).await.unwrap();
        assert_eq!(subject.staff_name, "Ann Tester");
        assert_eq!(subject.course_name, "Computer Science");

        let err = create_subject(
            &test_db.pool,
            &SubjectInput {
                name: "Networks".to_string(),
                course_id,
                staff_id: test_db.user_id("alice"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = create_subject(
            &test_db.pool,
            &SubjectInput {
                name: "Networks".to_string(),
                course_id: 999,
                staff_id: test_db.user_id("ann"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let subjects = db::find_subjects_by_staff(&test_db.pool, test_db.user_id("ann"))
            .await
            .unwrap();
        let names: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Algorithms", "Databases", "Math"]);
    }

    #[tokio::test]
    async fn test_create_user_rules() {
        let test_db = create_standard_test_db().await;

        let mut student = new_user("dana@college.test", "student");
        student.course_id = Some(test_db.course_id("Biology"));
        student.session_id = Some(test_db.session_id("2023"));
        let id = create_user(&test_db.pool, &student).await.unwrap();

        let stored = db::get_user(&test_db.pool, id).await.unwrap();
        assert_eq!(stored.role, Role::Student);
        assert_eq!(stored.full_name(), "Dana Scully");
        assert_eq!(stored.course_id, Some(test_db.course_id("Biology")));

        let hash: String = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&test_db.pool)
            .await
            .unwrap();
        assert!(bcrypt::verify("secret", &hash).unwrap());

        let err = create_user(&test_db.pool, &new_user("DANA@college.test", "staff"))
            .await
            .unwrap_err();
        match err {
            AppError::InvalidArgument(errors) => assert!(errors.has_field("email")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }

        let mut bad = new_user("not-an-email", "teacher");
        bad.gender = "X".to_string();
        match create_user(&test_db.pool, &bad).await.unwrap_err() {
            AppError::InvalidArgument(errors) => {
                assert!(errors.has_field("email"));
                assert!(errors.has_field("role"));
                assert!(errors.has_field("gender"));
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }

        let mut numeric = new_user("fox@college.test", "2");
        numeric.course_id = Some(test_db.course_id("Biology"));
        let id = create_user(&test_db.pool, &numeric).await.unwrap();
        assert_eq!(db::get_user(&test_db.pool, id).await.unwrap().role, Role::Staff);

        assert!(email_in_use(&test_db.pool, "Fox@College.test").await.unwrap());
        assert!(!email_in_use(&test_db.pool, "walter@college.test").await.unwrap());
    }

    #[tokio::test]
    async fn test_students_listed_by_course_and_session() {
        let test_db = create_standard_test_db().await;

        let students = db::find_students_by_course_session(
            &test_db.pool,
            test_db.course_id("Computer Science"),
            test_db.session_id("2023"),
        )
        .await
        .unwrap();

        let names: Vec<String> = students.iter().map(|s| s.full_name()).collect();
        assert_eq!(names, vec!["Alice Tester", "Bob Tester"]);
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let test_db = create_standard_test_db().await;

        let err = create_course(&test_db.pool, &CourseInput { name: "   ".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(ref errors) if errors.has_field("name")));

        let mut blank = new_user("blank@college.test", "admin");
        blank.first_name = "  ".to_string();
        match create_user(&test_db.pool, &blank).await.unwrap_err() {
            AppError::InvalidArgument(errors) => assert!(errors.has_field("first_name")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
        assert!(!email_in_use(&test_db.pool, "blank@college.test").await.unwrap());
    }

    #[tokio::test]
    async fn test_edit_subject() {
        let test_db = create_standard_test_db().await;
        let math = test_db.subject_id("Math");

        edit_subject(
            &test_db.pool,
            math,
            &SubjectInput {
                name: " Statistics ".to_string(),
                course_id: test_db.course_id("Biology"),
                staff_id: test_db.user_id("ben"),
            },
        )
        .await
        .unwrap();

        let subject = db::get_subject(&test_db.pool, math).await.unwrap();
        assert_eq!(subject.name, "Statistics");
        assert_eq!(subject.course_name, "Biology");
        assert_eq!(subject.staff_name, "Ben Tester");

        let err = edit_subject(
            &test_db.pool,
            math,
            &SubjectInput {
                name: "Statistics".to_string(),
                course_id: test_db.course_id("Biology"),
                staff_id: test_db.user_id("carl"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = edit_subject(
            &test_db.pool,
            999,
            &SubjectInput {
                name: "Statistics".to_string(),
                course_id: test_db.course_id("Biology"),
                staff_id: test_db.user_id("ben"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = edit_subject(
            &test_db.pool,
            math,
            &SubjectInput {
                name: "   ".to_string(),
                course_id: test_db.course_id("Biology"),
                staff_id: test_db.user_id("ben"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(db::get_subject(&test_db.pool, math).await.unwrap().name, "Statistics");
    }

    #[tokio::test]
    async fn test_edit_user_rules() {
        let test_db = create_standard_test_db().await;
        let alice = test_db.user_id("alice");
        let before = stored_hash(&test_db.pool, alice).await;

        // Keeping your own email is not a clash.
        let mut update = user_update("alice@college.test");
        update.course_id = Some(test_db.course_id("Biology"));
        update.session_id = Some(test_db.session_id("2023"));
        edit_user(&test_db.pool, alice, &update).await.unwrap();

        let stored = db::get_user(&test_db.pool, alice).await.unwrap();
        assert_eq!(stored.full_name(), "Alicia Moreno");
        assert_eq!(stored.address, "12 Elm Rd");
        assert_eq!(stored.course_id, Some(test_db.course_id("Biology")));
        assert_eq!(stored_hash(&test_db.pool, alice).await, before);

        let err = edit_user(&test_db.pool, alice, &user_update("BOB@college.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(ref errors) if errors.has_field("email")));

        let err = edit_user(&test_db.pool, alice, &user_update("not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(ref errors) if errors.has_field("email")));

        let mut moved = user_update("alicia@college.test");
        moved.password = Some("changed".to_string());
        edit_user(&test_db.pool, alice, &moved).await.unwrap();
        assert_eq!(db::get_user(&test_db.pool, alice).await.unwrap().email, "alicia@college.test");
        assert!(bcrypt::verify("changed", &stored_hash(&test_db.pool, alice).await).unwrap());

        let mut missing_course = user_update("alicia@college.test");
        missing_course.course_id = Some(999);
        assert!(matches!(
            edit_user(&test_db.pool, alice, &missing_course).await,
            Err(AppError::NotFound(_))
        ));

        assert!(matches!(
            edit_user(&test_db.pool, test_db.user_id("admin"), &user_update("root@college.test")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            edit_user(&test_db.pool, 999, &user_update("ghost@college.test")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let test_db = create_standard_test_db().await;
        let ann = test_db.user_id("ann");

        update_profile(
            &test_db.pool,
            ann,
            &ProfileUpdate {
                password: Some("new-secret".to_string()),
                first_name: " Annie ".to_string(),
                last_name: "Hall".to_string(),
                gender: "F".to_string(),
                address: "4 Oak Ave".to_string(),
            },
        )
        .await
        .unwrap();

        let stored = db::get_user(&test_db.pool, ann).await.unwrap();
        assert_eq!(stored.full_name(), "Annie Hall");
        assert_eq!(stored.email, "ann@college.test");
        assert_eq!(stored.role, Role::Staff);
        assert_eq!(stored.course_id, Some(test_db.course_id("Computer Science")));
        assert!(bcrypt::verify("new-secret", &stored_hash(&test_db.pool, ann).await).unwrap());

        let err = update_profile(
            &test_db.pool,
            ann,
            &ProfileUpdate {
                password: Some(String::new()),
                first_name: "   ".to_string(),
                last_name: "Hall".to_string(),
                gender: "Q".to_string(),
                address: String::new(),
            },
        )
        .await
        .unwrap_err();
        match err {
            AppError::InvalidArgument(errors) => {
                assert!(errors.has_field("password"));
                assert!(errors.has_field("first_name"));
                assert!(errors.has_field("gender"));
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
        assert_eq!(db::get_user(&test_db.pool, ann).await.unwrap().first_name, "Annie");
    }

    #[tokio::test]
    async fn test_remove_user() {
        let test_db = create_standard_test_db().await;
        let ben = test_db.user_id("ben");

        remove_user(&test_db.pool, ben).await.unwrap();
        assert!(matches!(db::get_user(&test_db.pool, ben).await, Err(AppError::NotFound(_))));
        // Subjects they taught go with them.
        assert!(matches!(
            db::get_subject(&test_db.pool, test_db.subject_id("Botany")).await,
            Err(AppError::NotFound(_))
        ));

        remove_user(&test_db.pool, test_db.user_id("carl")).await.unwrap();
        assert!(matches!(remove_user(&test_db.pool, ben).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            remove_user(&test_db.pool, test_db.user_id("admin")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(db::get_user(&test_db.pool, test_db.user_id("admin")).await.is_ok());
    }
}
