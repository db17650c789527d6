/// Property-based tests using proptest
/// Tests invariants of input handling that should hold for all inputs
use name_analyzer::db_storage::escape_like;
use name_analyzer::enrichment::EnrichmentResult;
use name_analyzer::models::{CreatePersonRequest, Gender, PersonFilter};
use name_analyzer::person_service::{build_person, normalize_country_code, validate_create};
use proptest::prelude::*;

// Property: create validation never panics and always yields trimmed values
proptest! {
    #[test]
    fn validate_create_never_panics(name in "\\PC*", surname in "\\PC*") {
        let _ = validate_create(CreatePersonRequest {
            name,
            surname,
            patronymic: None,
        });
    }

    #[test]
    fn validated_names_are_trimmed_and_non_empty(
        pad_left in "[ \t]{0,3}",
        name in "[A-Za-zА-Яа-я]{1,20}",
        pad_right in "[ \t]{0,3}",
    ) {
        let request = CreatePersonRequest {
            name: format!("{}{}{}", pad_left, name, pad_right),
            surname: format!("{}Ivanov{}", pad_right, pad_left),
            patronymic: Some(pad_left.clone()),
        };

        let validated = validate_create(request).unwrap();
        prop_assert_eq!(validated.name, name);
        prop_assert_eq!(validated.surname, "Ivanov");
        prop_assert_eq!(validated.patronymic, None);
    }

    #[test]
    fn whitespace_only_names_rejected(name in "[ \t\n]{0,10}") {
        let result = validate_create(CreatePersonRequest {
            name,
            surname: "Ivanov".to_string(),
            patronymic: None,
        });
        prop_assert!(result.is_err());
    }
}

// Property: enrichment fields are carried over exactly, absent stays absent
proptest! {
    #[test]
    fn build_person_carries_enrichment(
        age in proptest::option::of(0u32..=120),
        female in proptest::option::of(proptest::bool::ANY),
        nationality in proptest::option::of("[A-Z]{2}"),
    ) {
        let validated = validate_create(CreatePersonRequest {
            name: "Anna".to_string(),
            surname: "Ivanova".to_string(),
            patronymic: None,
        })
        .unwrap();
        let gender = female.map(|f| if f { Gender::Female } else { Gender::Male });

        let person = build_person(
            validated,
            EnrichmentResult { age, gender, nationality: nationality.clone() },
        );

        prop_assert_eq!(person.age, age.map(|a| a as i32));
        prop_assert_eq!(person.gender, gender.map(|g| g.as_str().to_string()));
        prop_assert_eq!(person.nationality, nationality);
    }
}

// Property: country codes
proptest! {
    #[test]
    fn two_letter_codes_accepted_in_any_case(code in "[a-zA-Z]{2}") {
        let normalized = normalize_country_code(&code).unwrap();
        prop_assert_eq!(normalized, code.to_ascii_uppercase());
    }

    #[test]
    fn other_lengths_rejected(code in "[A-Z]{3,6}|[A-Z]?") {
        prop_assert!(normalize_country_code(&code).is_err());
    }
}

// Property: LIKE escaping leaves no unescaped wildcard
proptest! {
    #[test]
    fn escaped_like_has_no_bare_wildcards(value in "\\PC*") {
        let escaped = escape_like(&value);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                // Every backslash escapes the next character
                prop_assert!(chars.next().is_some());
            } else {
                prop_assert!(c != '%' && c != '_');
            }
        }
    }
}

// Property: pagination bounds
proptest! {
    #[test]
    fn pagination_always_in_bounds(limit in proptest::option::of(any::<i64>()), offset in proptest::option::of(any::<i64>())) {
        let filter = PersonFilter { limit, offset, ..Default::default() };
        prop_assert!((1..=100).contains(&filter.limit()));
        prop_assert!(filter.offset() >= 0);
    }
}
