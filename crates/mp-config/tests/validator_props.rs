use mp_config::{ConfigError, Parameters, PotentialFlowSettings, Schema};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn negative_domain_size_always_fails(domain_size in i64::MIN..0) {
        let user = Parameters::from_value(json!({"domain_size": domain_size})).unwrap();
        let err = PotentialFlowSettings::from_parameters(&user).unwrap_err();
        let is_invalid_value = matches!(err, ConfigError::InvalidValue { .. });
        prop_assert!(is_invalid_value);
    }

    #[test]
    fn user_values_survive_merge(domain_size in 0_i64..4, echo_level in 0_i64..5) {
        let user = Parameters::from_value(json!({
            "domain_size": domain_size,
            "echo_level": echo_level
        }))
        .unwrap();
        let settings = PotentialFlowSettings::from_parameters(&user).unwrap();
        prop_assert_eq!(settings.domain_size, domain_size);
        prop_assert_eq!(settings.echo_level, echo_level);
        prop_assert_eq!(settings.model_part_name, "MainModelPart");
    }
}
