use dbwrap::{Database, DatabaseAction, Driver, ObjectMapper, Query, to_object, to_objects};
use indoc::indoc;

#[derive(Debug, Default, Clone, PartialEq)]
struct Parsable {
    id: i32,
    value: Option<String>,
    test: bool,
}

pub async fn objects<D: Driver>(database: &Database<D>) {
    database
        .action("DROP TABLE IF EXISTS parsable")
        .execute()
        .await
        .expect("Failed to drop the parsable table");
    database
        .action(indoc! {"
            CREATE TABLE parsable (
                id INTEGER PRIMARY KEY,
                text VARCHAR(64),
                test BOOLEAN NOT NULL
            )
        "})
        .execute()
        .await
        .expect("Failed to create the parsable table");
    let insert = Query::new("INSERT INTO parsable (id, text, test) VALUES (?, ?, ?)");
    for (id, text, test) in [(12, Some("test"), true), (13, None, false), (14, Some(""), true)] {
        database
            .action(insert.clone().bind(id).bind(text).bind(test))
            .execute()
            .await
            .expect("Failed to insert into the parsable table");
    }

    let mapper = ObjectMapper::builder(Parsable::default)
        .field("id", |v: &mut Parsable, id| v.id = id)
        .optional_field("text", |v: &mut Parsable, text| v.value = text)
        .field("test", |v: &mut Parsable, test| v.test = test)
        .build()
        .expect("Could not build the mapper");

    let first = database
        .action_mapped(
            Query::new("SELECT * FROM parsable WHERE id = ?").bind(12),
            to_object(mapper.clone()),
        )
        .query()
        .await
        .expect("Failed to query the first object");
    assert_eq!(
        first,
        Some(Parsable {
            id: 12,
            value: Some("test".into()),
            test: true,
        })
    );

    let all = database
        .action_mapped("SELECT * FROM parsable ORDER BY id", to_objects(mapper.clone()))
        .query()
        .await
        .expect("Failed to query the objects");
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].value, None);
    assert!(!all[1].test);
    assert_eq!(all[2].value.as_deref(), Some(""));

    let none = database
        .action_mapped(
            Query::new("SELECT * FROM parsable WHERE id = ?").bind(99),
            to_object(mapper),
        )
        .query()
        .await
        .expect("Failed to query a missing object");
    assert_eq!(none, None);
}
