#[cfg(test)]
mod tests {
    use dbwrap_core::Table;

    fn people() -> Table {
        Table::new(
            ["id", "name"],
            [[Some("1"), Some("a")], [Some("2"), Some("b")], [Some("3"), None]],
        )
        .expect("Could not build the table")
    }

    #[test]
    fn lookup() {
        let table = people();
        assert_eq!(table.attributes(), ["id", "name"]);
        assert_eq!(table.attribute(1), Some("name"));
        assert_eq!(table.attribute(2), None);
        assert_eq!(table.index_of("name"), Some(1));
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert!(!table.is_empty());
        assert_eq!(table[0].get(0), Some("1"));
        assert_eq!(table[1].get_by_name("name"), Some("b"));
        assert_eq!(table[2].get_by_name("name"), None);
        assert_eq!(table[2].get_by_name("missing"), None);
        assert_eq!(table[2].get(7), None);
        assert_eq!(table[0].labels(), table.attributes());
        assert_eq!(table[0].len(), 2);
    }

    #[test]
    fn columns() {
        let table = people();
        assert_eq!(table.column(0), Some(vec![Some("1"), Some("2"), Some("3")]));
        assert_eq!(table.column_by_name("name"), vec![Some("a"), Some("b"), None]);
        assert_eq!(table.column(2), None);
        assert!(table.column_by_name("missing").is_empty());
    }

    #[test]
    fn invalid() {
        assert!(Table::new(["id", "id"], [[Some("1"), Some("2")]]).is_err());
        assert!(Table::new(["id", "name"], [vec![Some("1")]]).is_err());
        assert!(Table::new(["id"], [vec![Some("1"), Some("2")]]).is_err());
    }

    #[test]
    fn empty() {
        let table = Table::empty(["id"]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.column(0), Some(vec![]));
        assert!(table.get(0).is_none());
        assert_eq!(table.to_string(), "id");
    }

    #[test]
    fn display() {
        assert_eq!(people().to_string(), "id, name\n1, a\n2, b\n3, null");
        assert_eq!(people()[2].to_string(), "3, null");
    }

    #[test]
    fn iterate() {
        let table = people();
        let ids = table
            .iter()
            .map(|row| row.get(0).unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["1", "2", "3"]);
        let names = (&table)
            .into_iter()
            .filter_map(|row| row.get_by_name("name"))
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b"]);
        let rows = table.into_iter().collect::<Vec<_>>();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].values(), [Some("2".to_string()), Some("b".to_string())]);
    }
}
