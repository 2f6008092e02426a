#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::clock::FixedClock;
    use crate::database::init_schema;
    use crate::db::{UserRecord, insert_course, insert_session, insert_subject, insert_user};
    use crate::env::Settings;
    use crate::error::AppError;
    use crate::workflows::library::FinePolicy;
    use chrono::NaiveDate;
    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::{Arc, Once};

    static INIT: Once = Once::new();
    static FIXTURE_HASH: &str = "$2b$04$fixturefixturefixturefixturefixturefixturefixturefixtu";

    pub fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("fixture date")
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        courses: Vec<String>,
        sessions: Vec<TestSession>,
        users: Vec<TestUser>,
        subjects: Vec<TestSubject>,
    }

    pub struct TestSession {
        pub label: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
    }

    pub struct TestUser {
        pub key: String,
        pub role: Role,
        pub course: Option<String>,
        pub session: Option<String>,
    }

    pub struct TestSubject {
        pub name: String,
        pub course: String,
        pub staff: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn course(mut self, name: &str) -> Self {
            self.courses.push(name.to_string());
            self
        }

        pub fn session(mut self, label: &str, start_date: &str, end_date: &str) -> Self {
            self.sessions.push(TestSession {
                label: label.to_string(),
                start_date: date(start_date),
                end_date: date(end_date),
            });
            self
        }

        pub fn admin(mut self, key: &str) -> Self {
            self.users.push(TestUser {
                key: key.to_string(),
                role: Role::Admin,
                course: None,
                session: None,
            });
            self
        }

        pub fn staff(mut self, key: &str, course: &str) -> Self {
            self.users.push(TestUser {
                key: key.to_string(),
                role: Role::Staff,
                course: Some(course.to_string()),
                session: None,
            });
            self
        }

        pub fn student(mut self, key: &str, course: &str, session: &str) -> Self {
            self.users.push(TestUser {
                key: key.to_string(),
                role: Role::Student,
                course: Some(course.to_string()),
                session: Some(session.to_string()),
            });
            self
        }

        pub fn subject(mut self, name: &str, course: &str, staff: &str) -> Self {
            self.subjects.push(TestSubject {
                name: name.to_string(),
                course: course.to_string(),
                staff: staff.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .parse_filters("debug")
                    .is_test(true)
                    .try_init();
            });

            // A single long-lived connection keeps the in-memory database alive.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?;

            init_schema(&pool).await?;

            let mut course_id_map = HashMap::new();
            let mut session_id_map = HashMap::new();
            let mut user_id_map = HashMap::new();
            let mut subject_id_map = HashMap::new();

            for name in &self.courses {
                let id = insert_course(&pool, name).await?;
                course_id_map.insert(name.clone(), id);
            }

            for session in &self.sessions {
                let id = insert_session(&pool, session.start_date, session.end_date).await?;
                session_id_map.insert(session.label.clone(), id);
            }

            for user in &self.users {
                let email = format!("{}@college.test", user.key);
                let first_name = capitalise(&user.key);
                let record = UserRecord {
                    email: &email,
                    password_hash: FIXTURE_HASH,
                    first_name: &first_name,
                    last_name: "Tester",
                    role: user.role,
                    gender: "F",
                    address: "",
                    course_id: user.course.as_ref().and_then(|c| course_id_map.get(c).copied()),
                    session_id: user.session.as_ref().and_then(|s| session_id_map.get(s).copied()),
                };

                let id = insert_user(&pool, &record).await?;
                user_id_map.insert(user.key.clone(), id);
            }

            for subject in &self.subjects {
                let course_id = course_id_map.get(&subject.course).copied().ok_or_else(|| {
                    AppError::NotFound(format!("fixture course {}", subject.course))
                })?;
                let staff_id = user_id_map.get(&subject.staff).copied().ok_or_else(|| {
                    AppError::NotFound(format!("fixture staff {}", subject.staff))
                })?;

                let id = insert_subject(&pool, &subject.name, course_id, staff_id).await?;
                subject_id_map.insert(subject.name.clone(), id);
            }

            Ok(TestDb {
                pool,
                course_id_map,
                session_id_map,
                user_id_map,
                subject_id_map,
            })
        }
    }

    fn capitalise(key: &str) -> String {
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub course_id_map: HashMap<String, i64>,
        pub session_id_map: HashMap<String, i64>,
        pub user_id_map: HashMap<String, i64>,
        pub subject_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn course_id(&self, name: &str) -> i64 {
            self.course_id_map[name]
        }

        pub fn session_id(&self, label: &str) -> i64 {
            self.session_id_map[label]
        }

        pub fn user_id(&self, key: &str) -> i64 {
            self.user_id_map[key]
        }

        pub fn subject_id(&self, name: &str) -> i64 {
            self.subject_id_map[name]
        }
    }

    /// One course, one session, an admin, two teachers and three students:
    /// alice and bob share `Math` with ann; carl is enrolled elsewhere.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .course("Computer Science")
            .course("Biology")
            .session("2023", "2023-01-01", "2023-12-31")
            .admin("admin")
            .staff("ann", "Computer Science")
            .staff("ben", "Biology")
            .student("alice", "Computer Science", "2023")
            .student("bob", "Computer Science", "2023")
            .student("carl", "Biology", "2023")
            .subject("Math", "Computer Science", "ann")
            .subject("Algorithms", "Computer Science", "ann")
            .subject("Botany", "Biology", "ben")
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb, today: &str) -> (Client, TestDb) {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            library: FinePolicy::default(),
        };

        let rocket = crate::init_rocket(
            test_db.pool.clone(),
            settings,
            Arc::new(FixedClock(date(today))),
        )
        .await;

        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }
}
