#[cfg(test)]
mod tests {
    use oxibind_core::{
        Attribute, AttributeValue, Attributes, Case, FetchStyle, Nulls, Policies, StatementError,
        Value,
    };

    #[test]
    fn attribute_keys() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_key(attribute.key()), Some(attribute));
        }
        assert_eq!(Attribute::from_key("CASE"), Some(Attribute::Case));
        assert_eq!(Attribute::from_key("mode"), None);
        assert_eq!(Attribute::DefaultFetchMode.to_string(), "fetch");
    }

    #[test]
    fn attribute_parse() {
        assert_eq!(
            Attribute::Case.parse_value("Upper").unwrap(),
            AttributeValue::Case(Case::Upper)
        );
        assert_eq!(
            Attribute::Nulls.parse_value("empty").unwrap(),
            AttributeValue::Nulls(Nulls::EmptyToNull)
        );
        assert_eq!(
            Attribute::Nulls.parse_value("to_string").unwrap(),
            AttributeValue::Nulls(Nulls::NullToString)
        );
        assert_eq!(
            Attribute::DefaultFetchMode.parse_value("assoc").unwrap(),
            AttributeValue::FetchStyle(FetchStyle::Associative)
        );
        assert_eq!(
            Attribute::ReturnLobs.parse_value("false").unwrap(),
            AttributeValue::Flag(false)
        );
        let error = Attribute::Case.parse_value("title").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidArgument(..))
        ));
        let error = Attribute::DefaultFetchMode.parse_value("tree").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::UnsupportedMode(..))
        ));
    }

    #[test]
    fn attribute_extract_pairs() {
        let mut attributes = Attributes::new();
        let rest = attributes
            .extract_pairs([
                ("case", "lower"),
                ("mode", "rwc"),
                ("autocommit", "0"),
                ("cache", "shared"),
            ])
            .unwrap();
        assert_eq!(
            rest,
            [
                ("mode".to_string(), "rwc".to_string()),
                ("cache".to_string(), "shared".to_string())
            ]
        );
        assert_eq!(
            attributes.get(Attribute::Case),
            Some(&AttributeValue::Case(Case::Lower))
        );
        assert_eq!(
            attributes.get(Attribute::Autocommit),
            Some(&AttributeValue::Flag(false))
        );
        assert_eq!(attributes.get(Attribute::Nulls), None);
    }

    #[test]
    fn attribute_value_conversion() {
        assert_eq!(
            Value::from(AttributeValue::FetchStyle(FetchStyle::Column)),
            Value::Varchar(Some("column".into()))
        );
        assert_eq!(
            Value::from(AttributeValue::Flag(true)),
            Value::Boolean(Some(true))
        );
    }

    #[test]
    fn case_fold() {
        assert_eq!(Case::Natural.fold("MixedName"), "MixedName");
        assert_eq!(Case::Lower.fold("MixedName"), "mixedname");
        assert_eq!(Case::Upper.fold("MixedName"), "MIXEDNAME");
    }

    #[test]
    fn policies_resolve() {
        let policies = Policies::resolve(|_| None);
        assert_eq!(policies, Policies::default());
        assert!(policies.return_lobs);
        assert!(!policies.uniform_nulls);

        let mut attributes = Attributes::new();
        attributes
            .set(Attribute::Case, Case::Upper)
            .set(Attribute::Nulls, Nulls::NullToString)
            .set(Attribute::ReturnLobs, false)
            .set(Attribute::UniformNulls, true);
        let policies = Policies::resolve(|k| attributes.get(k).cloned());
        assert_eq!(
            policies,
            Policies {
                case: Case::Upper,
                nulls: Nulls::NullToString,
                return_lobs: false,
                uniform_nulls: true,
            }
        );
    }

    #[test]
    fn fetch_style_codes() {
        for style in FetchStyle::ALL {
            assert_eq!(FetchStyle::try_from(style.code()).unwrap(), style);
            assert_eq!(FetchStyle::try_from(style.name()).unwrap(), style);
        }
        assert_eq!(FetchStyle::try_from(4).unwrap(), FetchStyle::Column);
        assert_eq!(FetchStyle::try_from("NUMERIC").unwrap(), FetchStyle::Numeric);
        assert_eq!(FetchStyle::try_from("class").unwrap(), FetchStyle::Object);
        for code in [0_i32, 8, 99, -1] {
            let error = FetchStyle::try_from(code).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<StatementError>(),
                Some(StatementError::UnsupportedMode(..))
            ));
        }
    }
}
