#[cfg(test)]
mod tests {
    use oxibind_core::{ServerVersion, StatementError};

    #[test]
    fn version_banner() {
        let version: ServerVersion =
            "Oracle Database 19c Enterprise Edition Release 19.3.0.0.0 - Production"
                .parse()
                .unwrap();
        assert_eq!(version.major(), 19);
        assert_eq!(version.minor(), 3);
        assert_eq!(version.patch(), Some(0));
        assert_eq!(version.components(), [19, 3, 0, 0, 0]);
        assert_eq!(version.to_string(), "19.3.0.0.0");
    }

    #[test]
    fn version_plain() {
        let version: ServerVersion = "3.45.1".parse().unwrap();
        assert_eq!(version.to_string(), "3.45.1");
        let version: ServerVersion = "v12.2".parse().unwrap();
        assert_eq!((version.major(), version.minor(), version.patch()), (12, 2, None));
        assert!("3.45.1".parse::<ServerVersion>().unwrap() > "3.9".parse().unwrap());
    }

    #[test]
    fn version_malformed() {
        for text in ["", "unknown", "release 19c", "1..2"] {
            let error = text.parse::<ServerVersion>().unwrap_err();
            match error.downcast_ref::<StatementError>() {
                Some(StatementError::MalformedEnvironmentValue { what, value }) => {
                    assert_eq!(*what, "server version");
                    assert_eq!(value, text);
                }
                other => panic!("Unexpected error {other:?}"),
            }
            assert!(format!("{error}").contains(text));
        }
    }
}
