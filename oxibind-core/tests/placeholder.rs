#[cfg(test)]
mod tests {
    use indoc::indoc;
    use oxibind_core::{marker_name, translate};

    #[test]
    fn translate_simple() {
        let (sql, params) = translate("SELECT * FROM t WHERE a = '?' AND b = ?");
        assert_eq!(sql, "SELECT * FROM t WHERE a = '?' AND b = :param1");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get(1), Some(":param1"));
        assert_eq!(params.get(2), None);
    }

    #[test]
    fn translate_order() {
        let (sql, params) = translate("INSERT INTO t (a, b, c) VALUES (?, ?, ?)");
        assert_eq!(
            sql,
            "INSERT INTO t (a, b, c) VALUES (:param1, :param2, :param3)"
        );
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            [(1, ":param1"), (2, ":param2"), (3, ":param3")]
        );
        assert_eq!(params.to_string(), "{1: :param1, 2: :param2, 3: :param3}");
    }

    #[test]
    fn translate_adjacent() {
        let (sql, params) = translate("??");
        assert_eq!(sql, ":param1:param2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn translate_many() {
        let input = vec!["?"; 12].join(",");
        let (sql, params) = translate(&input);
        let expected = (1..=12).map(marker_name).collect::<Vec<_>>().join(",");
        assert_eq!(sql, expected);
        assert_eq!(params.len(), 12);
        assert_eq!(params.get(10), Some(":param10"));
        assert_eq!(params.get(12), Some(":param12"));
    }

    #[test]
    fn translate_named_unchanged() {
        let input = "UPDATE t SET a = :a WHERE b = :b AND c = 'really?'";
        let (sql, params) = translate(input);
        assert_eq!(sql, input);
        assert!(params.is_empty());
    }

    #[test]
    fn translate_double_quotes() {
        let (sql, params) = translate(r#"SELECT "what?" FROM t WHERE a = ?"#);
        assert_eq!(sql, r#"SELECT "what?" FROM t WHERE a = :param1"#);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn translate_multiline() {
        let (sql, params) = translate(indoc! {"
            SELECT name, 'é?'
            FROM customers
            WHERE id = ?
              AND label <> 'x'
              AND city = ?
        "});
        assert_eq!(
            sql,
            indoc! {"
                SELECT name, 'é?'
                FROM customers
                WHERE id = :param1
                  AND label <> 'x'
                  AND city = :param2
            "}
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn translate_mixed_quotes() {
        // The closing `'` is read as opening a new literal after `"` toggled the flag.
        let (sql, params) = translate(r#"SELECT 'it"s' FROM t WHERE a = ? AND b = '?'"#);
        assert_eq!(sql, r#"SELECT 'it"s' FROM t WHERE a = ? AND b = ':param1'"#);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn translate_empty() {
        let (sql, params) = translate("");
        assert_eq!(sql, "");
        assert!(params.is_empty());
    }
}
