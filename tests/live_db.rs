//! Tests against a live server, gated behind `--ignored`.
//!
//! Configure the target with `PGMIRROR_TEST_DB`, `PGMIRROR_TEST_USER`,
//! `PGMIRROR_TEST_HOST`, and `PGMIRROR_TEST_PORT`; the default is a local
//! `pgmirror_testdb`.

use pgmirror::depend;
use pgmirror::diff::compute_diff;
use pgmirror::pg::catalog::read_database;
use pgmirror::pg::connection::PgConnection;
use sqlx::postgres::PgConnectOptions;

fn test_options() -> PgConnectOptions {
    let mut options = PgConnectOptions::new().database(
        &std::env::var("PGMIRROR_TEST_DB").unwrap_or_else(|_| "pgmirror_testdb".to_string()),
    );
    if let Ok(host) = std::env::var("PGMIRROR_TEST_HOST") {
        options = options.host(&host);
    }
    if let Ok(port) = std::env::var("PGMIRROR_TEST_PORT") {
        options = options.port(port.parse().expect("PGMIRROR_TEST_PORT must be a port"));
    }
    if let Ok(user) = std::env::var("PGMIRROR_TEST_USER") {
        options = options.username(&user);
    }
    options
}

#[tokio::test]
#[ignore = "needs a live PostgreSQL server"]
async fn extraction_is_deterministic_and_round_trips() {
    let conn = PgConnection::connect(test_options()).await.unwrap();

    let mut first = read_database(&conn).await.unwrap();
    depend::link(&mut first);
    let text_one = pgmirror::yaml::database_to_string(&first);

    let mut second = read_database(&conn).await.unwrap();
    depend::link(&mut second);
    let text_two = pgmirror::yaml::database_to_string(&second);
    assert_eq!(text_one, text_two, "two extractions must be byte-identical");

    let mut parsed = pgmirror::yaml::load::database_from_str(&text_one).unwrap();
    depend::link(&mut parsed);
    let ops = compute_diff(&first, &parsed).unwrap();
    assert!(ops.is_empty(), "round trip must diff to nothing: {ops:#?}");
}

#[tokio::test]
#[ignore = "needs a live PostgreSQL server"]
async fn server_version_is_supported() {
    let conn = PgConnection::connect(test_options()).await.unwrap();
    assert!(conn.version_num() >= 90400);
    assert!(conn.major_version() >= 9);
}
